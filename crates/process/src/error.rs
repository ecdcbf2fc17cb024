//! Process Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A process error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for process operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The program (or the compatibility launcher wrapping it) could not be
    /// found on disk or in `PATH`.
    #[display("program not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The program was found but the operating system refused to start it.
    #[display("failed to spawn program: {_0}")]
    Spawn(#[error(not(source))] String),
    /// The process ran to completion and reported failure.
    /// An exit code of `None` means it was terminated by a signal.
    #[display("process exited with code: {}", _0.map_or_else(|| "<signal>".to_string(), |c| c.to_string()))]
    Exited(#[error(not(source))] Option<i32>),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Spawn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound("wineconsole".to_string()).to_string(), "program not found: wineconsole");
        assert_eq!(ErrorKind::Exited(Some(3)).to_string(), "process exited with code: 3");
        assert_eq!(ErrorKind::Exited(None).to_string(), "process exited with code: <signal>");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::NotFound("x".to_string()).is_retryable());
        assert!(!ErrorKind::Exited(Some(1)).is_retryable());
        assert!(ErrorKind::Spawn("x".to_string()).is_retryable());
    }
}
