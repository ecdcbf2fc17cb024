//! Synchronous execution of external programs.
//!
//! - [`CommandSpec`] describes an invocation without running it.
//! - [`Dispatcher`] builds the extractor's [`CommandSpec`] for the host
//!   [`Platform`], wrapping it in a compatibility launcher where needed.
//! - [`ProcessRunner`] runs a [`CommandSpec`] to completion. [`SystemRunner`]
//!   spawns real child processes; `MockRunner` (behind the `mock` feature)
//!   records invocations for tests instead.

mod command;
pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod platform;
mod runner;

pub use crate::command::CommandSpec;
#[cfg(feature = "mock")]
pub use crate::mock::MockRunner;
pub use crate::platform::{DEFAULT_LAUNCHER, Dispatcher, Platform};
pub use crate::runner::{ProcessOutput, ProcessRunner, SystemRunner};
