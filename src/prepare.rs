use crate::error::{ErrorKind, Result};
use autodrome_cache::{ArchiveId, LogObserver, Observer, Plan, Simulator, WorldCacheBuilder};
use autodrome_config::Config;
use exn::ResultExt;
use std::path::Path;
use std::time::Instant;

/// Prints a numbered line per archive to stderr, on top of the log output.
struct Progress {
    total: usize,
    current: usize,
    started: Option<Instant>,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self { total, current: 0, started: None }
    }
}

impl Observer for Progress {
    fn on_archive_skipped(&mut self, archive: &ArchiveId, entry: &Path) {
        self.current += 1;
        LogObserver.on_archive_skipped(archive, entry);
        eprintln!("[{}/{}] {archive}: already cached", self.current, self.total);
    }

    fn on_archive_extracting(&mut self, archive: &ArchiveId, source: &Path) {
        self.current += 1;
        self.started = Some(Instant::now());
        LogObserver.on_archive_extracting(archive, source);
        eprintln!(
            "[{}/{}] {archive}: extracting {} (this takes a few minutes)...",
            self.current,
            self.total,
            source.display()
        );
    }

    fn on_archive_done(&mut self, archive: &ArchiveId, entry: &Path) {
        LogObserver.on_archive_done(archive, entry);
        let elapsed = self.started.take().map(|s| s.elapsed().as_secs()).unwrap_or_default();
        eprintln!("[{}/{}] {archive}: done in {elapsed}s", self.current, self.total);
    }
}

pub fn run(config: &Config, dry_run: bool) -> Result<()> {
    let simulator = config.simulator_paths();
    let builder = WorldCacheBuilder::new(&config.extractor.source).with_dispatcher(config.dispatcher());

    if dry_run {
        let cache = builder.cache(&simulator).or_raise(|| ErrorKind::Prepare)?;
        let staged = cache.staged_extractor().unwrap_or_else(|| config.extractor.source.clone());
        for archive in &config.archives {
            match cache.plan(archive, config.overwrite) {
                Plan::Hit(entry) => println!("skip     {archive}  ({})", entry.display()),
                Plan::Extract(_) => println!("extract  {archive}  $ {}", cache.command(&staged, archive)),
            }
        }
        return Ok(());
    }

    let mut progress = Progress::new(config.archives.len());
    let root = builder
        .build_observed(&simulator, &config.archives, config.overwrite, &mut progress)
        .or_raise(|| ErrorKind::Prepare)?;

    let definitions = root.world_definitions();
    let map = simulator.map_file(&config.map);
    if !definitions.is_dir() {
        tracing::warn!(path = %definitions.display(), "World definitions not found in cache");
    }
    if !map.is_file() {
        tracing::warn!(path = %map.display(), "Map file not found");
    }
    println!("cache    {}", root.path().display());
    println!("world    {}", definitions.display());
    println!("map      {}", map.display());
    Ok(())
}
