use crate::archive::{ArchiveCache, ArchiveId, Plan};
use crate::error::Result;
use crate::observer::{LogObserver, Observer};
use crate::simulator::Simulator;
use autodrome_process::{Dispatcher, ProcessRunner, SystemRunner};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Handle to a cache directory in which every requested archive is present.
///
/// This is what gets handed to the map and definition parsers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheRoot {
    path: PathBuf,
}

impl CacheRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self, archive: &ArchiveId) -> PathBuf {
        self.path.join(archive)
    }

    /// Root of the world definitions extracted from `def.scs`.
    pub fn world_definitions(&self) -> PathBuf {
        self.path.join("def").join("world")
    }
}

impl AsRef<Path> for CacheRoot {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Entry point for preparing a simulator's archive cache.
///
/// The builder holds only configuration: where the bundled extractor lives,
/// how to invoke it on this platform, and what runs it. Everything about a
/// particular install comes from the [`Simulator`] passed to
/// [`build`](Self::build).
///
/// # Examples
///
/// ```no_run
/// use autodrome_cache::{ArchiveId, SimulatorPaths, WorldCacheBuilder};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let simulator = SimulatorPaths::new("/games/ets2", "/home/driver/ets2/mod");
/// let archives: Vec<ArchiveId> = vec!["def".parse()?];
/// let root = WorldCacheBuilder::new("/opt/autodrome/bin/scs_extractor.exe")
///     .build(&simulator, &archives, false)?;
/// println!("world definitions in {}", root.world_definitions().display());
/// # Ok(())
/// # }
/// ```
pub struct WorldCacheBuilder<R = SystemRunner> {
    extractor: PathBuf,
    dispatcher: Dispatcher,
    runner: R,
}

impl WorldCacheBuilder {
    /// Builder that spawns real processes, dispatching for the host platform
    /// with the default compatibility launcher.
    pub fn new(extractor: impl Into<PathBuf>) -> Self {
        Self { extractor: extractor.into(), dispatcher: Dispatcher::default(), runner: SystemRunner }
    }
}

impl<R> WorldCacheBuilder<R> {
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_runner<T>(self, runner: T) -> WorldCacheBuilder<T> {
        WorldCacheBuilder { extractor: self.extractor, dispatcher: self.dispatcher, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn extractor(&self) -> &Path {
        &self.extractor
    }
}

impl<R: ProcessRunner> WorldCacheBuilder<R> {
    /// The archive cache for `simulator`, borrowing this builder's runner.
    pub fn cache(&self, simulator: &impl Simulator) -> Result<ArchiveCache<&R>> {
        ArchiveCache::new(
            simulator.cache_dir(),
            simulator.root_game_folder(),
            &self.extractor,
            self.dispatcher.clone(),
            &self.runner,
        )
    }

    /// [`build_observed`](Self::build_observed), reporting progress through
    /// [`LogObserver`].
    pub fn build(&self, simulator: &impl Simulator, archives: &[ArchiveId], overwrite: bool) -> Result<CacheRoot> {
        self.build_observed(simulator, archives, overwrite, &mut LogObserver)
    }

    /// Make sure every archive in `archives` is extracted into the simulator's
    /// cache directory, one after the other in list order.
    ///
    /// The first failure aborts the build: later archives are not attempted,
    /// since a partially populated cache is of no use to the map parser.
    #[instrument(skip_all, fields(archives = archives.len(), overwrite))]
    pub fn build_observed(
        &self,
        simulator: &impl Simulator,
        archives: &[ArchiveId],
        overwrite: bool,
        observer: &mut dyn Observer,
    ) -> Result<CacheRoot> {
        let cache = self.cache(simulator)?;
        tracing::info!(cache = %cache.directory().display(), "Setting up extracted game archives cache");
        cache.create_directory()?;
        for archive in archives {
            match cache.plan(archive, overwrite) {
                Plan::Hit(entry) => observer.on_archive_skipped(archive, &entry),
                Plan::Extract(_) => {
                    observer.on_archive_extracting(archive, &cache.source(archive));
                    let entry = cache.extract(archive)?;
                    observer.on_archive_done(archive, &entry);
                },
            }
        }
        Ok(CacheRoot::new(cache.directory()))
    }
}
