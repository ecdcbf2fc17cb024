//! Platform-aware command construction.
//!
//! The game tools are Windows executables. On Windows they run directly; on
//! every other host they have to be wrapped by a compatibility launcher
//! (Wine's `wineconsole` by default, since the tools are console programs).
//!
//! [`Dispatcher`] performs no I/O and holds no state beyond the strategy it
//! was created with, so tests can construct either variant on any host.

use crate::CommandSpec;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Compatibility launcher used on non-Windows hosts unless configured otherwise.
pub const DEFAULT_LAUNCHER: &str = "wineconsole";

/// Whether the host can execute the extractor natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Native,
    Foreign,
}

impl Platform {
    /// Classify an operating system identifier as reported by
    /// [`std::env::consts::OS`].
    pub fn from_os(os: &str) -> Self {
        if os.eq_ignore_ascii_case("windows") { Self::Native } else { Self::Foreign }
    }

    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }
}

/// Strategy for turning an extractor invocation into a [`CommandSpec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatcher {
    /// Execute the extractor directly.
    Direct,
    /// Prepend a compatibility launcher to the invocation.
    Wrapped { launcher: OsString },
}

impl Dispatcher {
    pub fn for_platform(platform: Platform, launcher: impl Into<OsString>) -> Self {
        match platform {
            Platform::Native => Self::Direct,
            Platform::Foreign => Self::Wrapped { launcher: launcher.into() },
        }
    }

    /// Dispatcher for the host this process is running on.
    pub fn for_current(launcher: impl Into<OsString>) -> Self {
        Self::for_platform(Platform::current(), launcher)
    }

    pub fn build_command(&self, executable: &Path, archive_file: &OsStr, destination: &Path) -> CommandSpec {
        let invocation = [executable.as_os_str(), archive_file, destination.as_os_str()];
        match self {
            Self::Direct => CommandSpec::new(executable).args(&invocation[1..]),
            Self::Wrapped { launcher } => CommandSpec::new(launcher).args(invocation),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::for_current(DEFAULT_LAUNCHER)
    }
}
