//! Idempotent extraction of game archives into an on-disk cache.
//!
//! The game ships its data in `.scs` archives that only a bundled Windows
//! tool can unpack. [`WorldCacheBuilder`] makes sure every requested archive
//! has been unpacked into `<mod_dir>/cache/<archive>/`, running the tool only
//! for archives that are missing (or everything, when asked to overwrite):
//!
//! - [`ArchiveCache`] decides per archive between reusing and extracting, and
//!   runs the extraction.
//! - [`staging`] places the tool inside the game folder for exactly as long
//!   as it runs.
//! - [`Observer`] receives progress events, e.g. for a command-line UI.
//!
//! Archives are processed one at a time. Nothing here guards against two
//! builds targeting the same cache directory concurrently.

mod archive;
mod builder;
pub mod error;
mod observer;
mod simulator;
pub mod staging;

pub use crate::archive::{ARCHIVE_EXTENSION, ArchiveCache, ArchiveId, Plan};
pub use crate::builder::{CacheRoot, WorldCacheBuilder};
pub use crate::observer::{LogObserver, Observer};
pub use crate::simulator::{CACHE_DIR_NAME, MAP_DIR_NAME, Simulator, SimulatorPaths};
