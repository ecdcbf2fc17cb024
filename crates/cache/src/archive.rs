//! Per-archive cache entries.
//!
//! Each archive `<root>/<id>.scs` is extracted into `<cache>/<id>/`. Whether
//! that directory exists is the only freshness signal: there are no
//! checksums, timestamps or completion markers. An entry that exists is
//! trusted unless the caller asks for an overwrite, which is why a failed
//! extraction must never leave its directory behind.

use crate::error::{Error, ErrorKind, Result};
use crate::staging::with_staged_executable;
use autodrome_process::{CommandSpec, Dispatcher, ProcessRunner};
use exn::ResultExt;
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::instrument;

/// File extension of the game's archive format.
pub const ARCHIVE_EXTENSION: &str = "scs";

/// The short name of one source archive, such as `def` for `def.scs`.
///
/// Identifiers are single, plain path components without the `.scs`
/// extension, so they can be joined onto both the game root and the cache
/// directory without escaping either.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the source archive, e.g. `def.scs`.
    pub fn file_name(&self) -> OsString {
        format!("{}.{ARCHIVE_EXTENSION}", self.0).into()
    }
}

impl FromStr for ArchiveId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut components = Path::new(s).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        let has_extension = Path::new(s).extension().is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if s.is_empty() || s.contains(['/', '\\', '\0']) || !single_normal || has_extension {
            exn::bail!(ErrorKind::InvalidArchiveId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ArchiveId {
    type Error = ErrorKind;
    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse().map_err(|e: Error| (*e).clone())
    }
}

impl From<ArchiveId> for String {
    fn from(value: ArchiveId) -> Self {
        value.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ArchiveId {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// What [`ArchiveCache::ensure`] would do for an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Plan {
    /// The entry exists and will be reused as-is.
    Hit(PathBuf),
    /// The extractor must run to (re)populate this entry.
    Extract(PathBuf),
}

impl Plan {
    pub fn path(&self) -> &Path {
        match self {
            Self::Hit(path) | Self::Extract(path) => path,
        }
    }
}

/// A directory of extracted archives, populated on demand.
///
/// Extraction copies the bundled extractor into the simulator's root folder,
/// runs it there through the configured [`Dispatcher`] and
/// [`ProcessRunner`], and removes the copy again afterwards, whatever the
/// outcome.
pub struct ArchiveCache<R> {
    directory: PathBuf,
    game_root: PathBuf,
    extractor: PathBuf,
    dispatcher: Dispatcher,
    runner: R,
}

impl<R: ProcessRunner> ArchiveCache<R> {
    /// # Arguments
    /// * `directory` - Cache root; one subdirectory per archive is created in it.
    /// * `game_root` - Simulator install folder holding the `.scs` archives.
    ///   The extractor is staged and run here.
    /// * `extractor` - Bundled extractor executable to stage.
    ///
    /// Relative paths are resolved against the current working directory
    /// here, since the extractor itself runs with `game_root` as its working
    /// directory and would otherwise read them relative to that.
    pub fn new(
        directory: impl AsRef<Path>,
        game_root: impl AsRef<Path>,
        extractor: impl AsRef<Path>,
        dispatcher: Dispatcher,
        runner: R,
    ) -> Result<Self> {
        Ok(Self {
            directory: absolute(directory.as_ref())?,
            game_root: absolute(game_root.as_ref())?,
            extractor: absolute(extractor.as_ref())?,
            dispatcher,
            runner,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the cache entry for `archive`, whether or not it exists.
    pub fn entry(&self, archive: &ArchiveId) -> PathBuf {
        self.directory.join(archive)
    }

    /// Path of the source archive inside the simulator's root folder.
    pub fn source(&self, archive: &ArchiveId) -> PathBuf {
        self.game_root.join(archive.file_name())
    }

    /// Decide between reusing and (re)extracting an entry. Side-effect free.
    pub fn plan(&self, archive: &ArchiveId, overwrite: bool) -> Plan {
        let entry = self.entry(archive);
        if entry.exists() && !overwrite { Plan::Hit(entry) } else { Plan::Extract(entry) }
    }

    /// The command the extractor would be run with, given where it gets staged.
    pub fn command(&self, staged: &Path, archive: &ArchiveId) -> CommandSpec {
        self.dispatcher.build_command(staged, &archive.file_name(), &self.directory)
    }

    /// Where the extractor is copied to for the duration of an extraction.
    pub fn staged_extractor(&self) -> Option<PathBuf> {
        self.extractor.file_name().map(|name| self.game_root.join(name))
    }

    /// Make sure `archive` is present in the cache, extracting it if it is
    /// missing or `overwrite` is set. Returns the entry path.
    ///
    /// A cache hit spawns no process and stages nothing.
    pub fn ensure(&self, archive: &ArchiveId, overwrite: bool) -> Result<PathBuf> {
        match self.plan(archive, overwrite) {
            Plan::Hit(entry) => {
                tracing::debug!(%archive, entry = %entry.display(), "Cache hit; skipping extraction");
                Ok(entry)
            },
            Plan::Extract(_) => self.extract(archive),
        }
    }

    /// Create the cache directory and every missing parent. Idempotent.
    pub fn create_directory(&self) -> Result<()> {
        std::fs::create_dir_all(&self.directory).or_raise(|| ErrorKind::CacheDirectory(self.directory.clone()))
    }

    /// Unconditionally run the extractor for `archive`.
    ///
    /// On a non-zero exit any directory the extractor left behind is removed,
    /// so the next [`ensure`](Self::ensure) tries again instead of trusting a
    /// half-written entry.
    #[instrument(skip_all, fields(%archive))]
    pub fn extract(&self, archive: &ArchiveId) -> Result<PathBuf> {
        self.create_directory()?;
        let source = self.source(archive);
        if !source.is_file() {
            exn::bail!(ErrorKind::ArchiveNotFound(source));
        }
        let entry = self.entry(archive);

        let outcome = with_staged_executable(&self.extractor, &self.game_root, |staged| {
            let command = self.command(staged, archive);
            tracing::info!(%command, "Extracting archive");
            self.runner.run(&command, &self.game_root)
        })?;

        let output = outcome.or_raise(|| ErrorKind::Launch(archive.clone()))?;
        if !output.success() {
            if !output.stderr.is_empty() {
                tracing::warn!(stderr = %String::from_utf8_lossy(&output.stderr), "Extractor reported errors");
            }
            self.discard(&entry);
            return output.check().map(|_| entry).or_raise(|| ErrorKind::Extraction(archive.clone()));
        }
        if !entry.exists() {
            exn::bail!(ErrorKind::IncompleteExtraction(archive.clone()));
        }
        tracing::info!(entry = %entry.display(), "Archive extracted");
        Ok(entry)
    }

    fn discard(&self, entry: &Path) {
        if !entry.exists() {
            return;
        }
        tracing::debug!(entry = %entry.display(), "Removing partial cache entry");
        let removed = if entry.is_dir() { std::fs::remove_dir_all(entry) } else { std::fs::remove_file(entry) };
        if let Err(e) = removed {
            // The next run will see the entry and skip it. Nothing more can
            // be done here without hiding the extraction failure.
            tracing::warn!(entry = %entry.display(), error = %e, "Failed to remove partial cache entry");
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodrome_process::{MockRunner, Platform, ProcessOutput};
    use rstest::rstest;
    use std::fs;

    const EXTRACTOR: &str = "scs_extractor.exe";

    struct Fixture {
        _temp: tempfile::TempDir,
        game_root: PathBuf,
        cache_dir: PathBuf,
        extractor: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempfile::tempdir().unwrap();
            let game_root = temp.path().join("game");
            let cache_dir = temp.path().join("mod/cache");
            let bundle = temp.path().join("bundle");
            fs::create_dir_all(&game_root).unwrap();
            fs::create_dir_all(&bundle).unwrap();
            fs::write(game_root.join("def.scs"), b"archive").unwrap();
            let extractor = bundle.join(EXTRACTOR);
            fs::write(&extractor, b"MZ").unwrap();
            Self { _temp: temp, game_root, cache_dir, extractor }
        }

        fn cache<R: ProcessRunner>(&self, runner: R) -> ArchiveCache<R> {
            let dispatcher = Dispatcher::for_platform(Platform::Native, "wineconsole");
            ArchiveCache::new(&self.cache_dir, &self.game_root, &self.extractor, dispatcher, runner).unwrap()
        }
    }

    /// Imitates the extractor: `<exe> <name>.scs <dest>` creates `<dest>/<name>/marker.txt`.
    fn writes_marker(exit_code: i32) -> MockRunner {
        MockRunner::new(move |command, _| {
            let args: Vec<_> = command.arguments().collect();
            let name = Path::new(args[0]).file_stem().unwrap();
            let entry = Path::new(args[1]).join(name);
            fs::create_dir_all(&entry).unwrap();
            fs::write(entry.join("marker.txt"), b"ok").unwrap();
            ProcessOutput::new(Some(exit_code), Vec::new(), Vec::new())
        })
    }

    fn def() -> ArchiveId {
        "def".parse().unwrap()
    }

    #[rstest]
    #[case("def")]
    #[case("base")]
    #[case("dlc_east")]
    #[case("locale.v2")]
    fn accepts_archive_ids(#[case] id: &str) {
        let archive: ArchiveId = id.parse().unwrap();
        assert_eq!(archive.as_str(), id);
        assert_eq!(archive.file_name(), OsString::from(format!("{id}.scs")));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("def/world")]
    #[case("..\\def")]
    #[case("/def")]
    #[case("def.scs")]
    #[case("DEF.SCS")]
    #[case("de\0f")]
    fn rejects_archive_ids(#[case] id: &str) {
        let err = id.parse::<ArchiveId>().unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidArchiveId(id.to_string()));
    }

    #[test]
    fn ensure_is_idempotent() {
        let fixture = Fixture::new();
        let cache = fixture.cache(writes_marker(0));
        let first = cache.ensure(&def(), false).unwrap();
        let second = cache.ensure(&def(), false).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, fixture.cache_dir.join("def"));
        assert!(first.join("marker.txt").is_file());
        assert_eq!(cache.runner.calls(), 1);
    }

    #[test]
    fn overwrite_always_extracts() {
        let fixture = Fixture::new();
        let cache = fixture.cache(writes_marker(0));
        cache.ensure(&def(), false).unwrap();
        cache.ensure(&def(), true).unwrap();
        cache.ensure(&def(), true).unwrap();
        assert_eq!(cache.runner.calls(), 3);
    }

    #[test]
    fn plan_reflects_entry_presence() {
        let fixture = Fixture::new();
        let cache = fixture.cache(MockRunner::exiting(0));
        let entry = fixture.cache_dir.join("def");
        assert_eq!(cache.plan(&def(), false), Plan::Extract(entry.clone()));
        fs::create_dir_all(&entry).unwrap();
        assert_eq!(cache.plan(&def(), false), Plan::Hit(entry.clone()));
        assert_eq!(cache.plan(&def(), true), Plan::Extract(entry));
        assert_eq!(cache.runner.calls(), 0);
    }

    #[test]
    fn extraction_runs_in_game_root_with_staged_extractor() {
        let fixture = Fixture::new();
        let cache = fixture.cache(writes_marker(0));
        cache.ensure(&def(), false).unwrap();
        let invocations = cache.runner.invocations();
        let (command, cwd) = &invocations[0];
        assert_eq!(cwd, &fixture.game_root);
        let staged = fixture.game_root.join(EXTRACTOR);
        assert_eq!(command.argv(), vec![staged.as_os_str(), "def.scs".as_ref(), fixture.cache_dir.as_os_str()]);
        // Staged copy is gone, the bundled original is untouched.
        assert!(!staged.exists());
        assert!(fixture.extractor.is_file());
        assert_eq!(cache.staged_extractor(), Some(staged));
    }

    #[test]
    fn creates_cache_directory_with_parents() {
        let fixture = Fixture::new();
        assert!(!fixture.cache_dir.exists());
        let cache = fixture.cache(writes_marker(0));
        cache.ensure(&def(), false).unwrap();
        assert!(fixture.cache_dir.is_dir());
    }

    #[test]
    fn failed_extraction_leaves_no_entry_and_retries() {
        let fixture = Fixture::new();
        let cache = fixture.cache(writes_marker(1));
        let err = cache.ensure(&def(), false).unwrap_err();
        assert_eq!(*err, ErrorKind::Extraction(def()));
        assert!(!fixture.cache_dir.join("def").exists());
        assert!(!fixture.game_root.join(EXTRACTOR).exists());

        // Nothing was cached, so the next call attempts extraction again.
        assert!(cache.ensure(&def(), false).is_err());
        assert_eq!(cache.runner.calls(), 2);
    }

    #[test]
    fn failed_overwrite_discards_previous_entry() {
        let fixture = Fixture::new();
        fs::create_dir_all(fixture.cache_dir.join("def/world")).unwrap();
        let cache = fixture.cache(MockRunner::exiting(2));
        assert!(cache.ensure(&def(), true).is_err());
        assert!(!fixture.cache_dir.join("def").exists());
    }

    #[test]
    fn launch_failure_is_reported_per_archive() {
        let fixture = Fixture::new();
        let cache = fixture.cache(MockRunner::unlaunchable());
        let err = cache.ensure(&def(), false).unwrap_err();
        assert_eq!(*err, ErrorKind::Launch(def()));
        assert!(!fixture.game_root.join(EXTRACTOR).exists());
    }

    #[test]
    fn success_without_output_is_incomplete() {
        let fixture = Fixture::new();
        let cache = fixture.cache(MockRunner::exiting(0));
        let err = cache.ensure(&def(), false).unwrap_err();
        assert_eq!(*err, ErrorKind::IncompleteExtraction(def()));
    }

    #[test]
    fn missing_source_archive_spawns_nothing() {
        let fixture = Fixture::new();
        let cache = fixture.cache(writes_marker(0));
        let base: ArchiveId = "base".parse().unwrap();
        let err = cache.ensure(&base, false).unwrap_err();
        assert_eq!(*err, ErrorKind::ArchiveNotFound(fixture.game_root.join("base.scs")));
        assert_eq!(cache.runner.calls(), 0);
    }

    #[test]
    fn missing_extractor_is_a_staging_failure() {
        let fixture = Fixture::new();
        fs::remove_file(&fixture.extractor).unwrap();
        let cache = fixture.cache(writes_marker(0));
        let err = cache.ensure(&def(), false).unwrap_err();
        assert!(matches!(*err, ErrorKind::Staging(_)));
        assert_eq!(cache.runner.calls(), 0);
    }
}
