//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Process failures are attached as
//! children of the cache error that caused them, so the exit code (or the
//! missing launcher) stays visible in the error tree.

use crate::archive::ArchiveId;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
///
/// ### Fatal for the current archive (and the whole build)
/// - [`ErrorKind::Staging`]
/// - [`ErrorKind::Launch`]
/// - [`ErrorKind::Extraction`]
/// - [`ErrorKind::IncompleteExtraction`]
///
/// ### Setup Errors
/// - [`ErrorKind::InvalidArchiveId`]
/// - [`ErrorKind::ArchiveNotFound`]
/// - [`ErrorKind::InvalidPath`]
/// - [`ErrorKind::CacheDirectory`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Archive identifiers are bare names such as `def`.
    #[display("invalid archive identifier: {_0:?}")]
    InvalidArchiveId(#[error(not(source))] String),
    /// The source archive does not exist in the simulator's root folder.
    #[display("archive not found: {}", _0.display())]
    ArchiveNotFound(#[error(not(source))] PathBuf),
    /// A path could not be resolved against the current working directory.
    #[display("cannot resolve path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The cache directory could not be created.
    #[display("cannot create cache directory: {}", _0.display())]
    CacheDirectory(#[error(not(source))] PathBuf),
    /// The extractor could not be copied into place (disk space, permissions,
    /// missing bundled executable).
    #[display("cannot stage extractor at: {}", _0.display())]
    Staging(#[error(not(source))] PathBuf),
    /// The extractor, or the compatibility launcher wrapping it, could not be
    /// started.
    #[display("cannot launch extractor for archive '{_0}'")]
    Launch(#[error(not(source))] ArchiveId),
    /// The extractor ran and reported failure. The cache entry was discarded.
    #[display("extraction of archive '{_0}' failed")]
    Extraction(#[error(not(source))] ArchiveId),
    /// The extractor reported success but the cache entry does not exist.
    #[display("extraction of archive '{_0}' produced no cache entry")]
    IncompleteExtraction(#[error(not(source))] ArchiveId),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Staging(_) | Self::Extraction(_) | Self::IncompleteExtraction(_))
    }
}
