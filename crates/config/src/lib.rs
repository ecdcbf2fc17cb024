//! Layered configuration for autodrome.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. Built-in defaults.
//! 2. `autodrome.toml` in the platform configuration directory, if present.
//! 3. An explicit file passed to [`Loader::file`] (TOML, YAML or JSON, chosen
//!    by extension).
//! 4. `AUTODROME_*` environment variables; `__` separates nested keys, so
//!    `AUTODROME_SIMULATOR__ROOT` sets `simulator.root`.
//! 5. Individual values set with [`Loader::set`] (command-line flags).
//!
//! ```toml
//! archives = ["def"]
//! overwrite = false
//! map = "indy500.txt"
//!
//! [simulator]
//! root = "/games/steamapps/common/American Truck Simulator"
//! mod_dir = "/home/driver/.local/share/American Truck Simulator/mod"
//!
//! [extractor]
//! source = "/opt/autodrome/bin/scs_extractor.exe"
//! launcher = "wineconsole"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use autodrome_cache::{ArchiveId, SimulatorPaths};
use autodrome_process::{DEFAULT_LAUNCHER, Dispatcher};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "autodrome.toml";
pub const ENV_PREFIX: &str = "AUTODROME_";
pub const DEFAULT_MAP: &str = "indy500.txt";
pub const EXTRACTOR_FILE_NAME: &str = "scs_extractor.exe";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    /// Archives to extract, in order.
    #[serde(default = "default_archives")]
    pub archives: Vec<ArchiveId>,
    /// Re-extract archives even when already cached.
    #[serde(default)]
    pub overwrite: bool,
    /// Text map file inside `<mod_dir>/map`.
    #[serde(default = "default_map")]
    pub map: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Game install folder holding the `.scs` archives.
    pub root: PathBuf,
    /// Writable mod directory; the cache is created inside it.
    pub mod_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Bundled extractor executable, copied into the game folder for each run.
    #[serde(default = "default_extractor_source")]
    pub source: PathBuf,
    /// Compatibility launcher used on hosts that cannot run the extractor natively.
    #[serde(default = "default_launcher")]
    pub launcher: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { source: default_extractor_source(), launcher: default_launcher() }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "autodrome")
}

fn default_archives() -> Vec<ArchiveId> {
    // Infallible: a plain literal identifier.
    "def".parse().map(|def| vec![def]).unwrap_or_default()
}

fn default_map() -> String {
    DEFAULT_MAP.to_string()
}

fn default_launcher() -> String {
    DEFAULT_LAUNCHER.to_string()
}

fn default_extractor_source() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("bin"))
        .unwrap_or_else(|| PathBuf::from("bin"))
        .join(EXTRACTOR_FILE_NAME)
}

/// Location of the implicit per-user configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    pub fn simulator_paths(&self) -> SimulatorPaths {
        SimulatorPaths::new(&self.simulator.root, &self.simulator.mod_dir)
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::for_current(&self.extractor.launcher)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, path) in [("simulator.root", &self.simulator.root), ("simulator.mod_dir", &self.simulator.mod_dir)] {
            if !path.is_absolute() {
                exn::bail!(ErrorKind::Invalid(format!("{key} must be an absolute path, got {}", path.display())));
            }
        }
        if self.archives.is_empty() {
            exn::bail!(ErrorKind::Invalid("archives must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.archives.iter().find(|a| !seen.insert(*a)) {
            exn::bail!(ErrorKind::Invalid(format!("archive '{duplicate}' is listed more than once")));
        }
        if self.extractor.launcher.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("extractor.launcher must not be empty".to_string()));
        }
        if self.map.is_empty() || self.map.contains(['/', '\\']) {
            exn::bail!(ErrorKind::Invalid(format!("map must be a plain file name, got {:?}", self.map)));
        }
        Ok(())
    }

    /// Anchor `extractor.source`, and a `launcher` given as a relative path such
    /// as `bin/wine`, to the current directory. A bare launcher name is left
    /// alone for `PATH` lookup.
    fn resolve_paths(mut self) -> Result<Self> {
        self.extractor.source = absolute(&self.extractor.source)?;
        let launcher = Path::new(&self.extractor.launcher);
        if !launcher.is_absolute() && launcher.components().count() > 1 {
            self.extractor.launcher = absolute(launcher)?.to_string_lossy().into_owned();
        }
        Ok(self)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).or_raise(|| ErrorKind::Invalid(format!("cannot resolve path {}", path.display())))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let archives: Vec<_> = self.archives.iter().map(ArchiveId::as_str).collect();
        writeln!(f, "simulator.root     = {}", self.simulator.root.display())?;
        writeln!(f, "simulator.mod_dir  = {}", self.simulator.mod_dir.display())?;
        writeln!(f, "extractor.source   = {}", self.extractor.source.display())?;
        writeln!(f, "extractor.launcher = {}", self.extractor.launcher)?;
        writeln!(f, "archives           = [{}]", archives.join(", "))?;
        writeln!(f, "overwrite          = {}", self.overwrite)?;
        write!(f, "map                = {}", self.map)
    }
}

/// Builds a [`Config`] from layered sources.
///
/// # Examples
///
/// ```no_run
/// use autodrome_config::Loader;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Loader::new()
///     .file(Path::new("autodrome.yaml"))?
///     .env()
///     .set("overwrite", true)
///     .load()?;
/// # Ok(())
/// # }
/// ```
pub struct Loader {
    figment: Figment,
}

impl Loader {
    /// Start from the per-user configuration file, if there is one.
    pub fn new() -> Self {
        let figment = match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading user configuration");
                Figment::new().merge(Toml::file(path))
            },
            _ => Figment::new(),
        };
        Self { figment }
    }

    /// Start from nothing but the built-in defaults.
    pub fn empty() -> Self {
        Self { figment: Figment::new() }
    }

    /// Merge a configuration file; its format is chosen by extension.
    pub fn file(mut self, path: &Path) -> Result<Self> {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        self.figment = match extension.as_deref() {
            Some("toml") => self.figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => self.figment.merge(Yaml::file(path)),
            Some("json") => self.figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "Merged configuration file");
        Ok(self)
    }

    /// Merge `AUTODROME_*` environment variables.
    pub fn env(mut self) -> Self {
        self.figment = self.figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        self
    }

    /// Override a single (dotted) key, e.g. `simulator.root`.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.figment = self.figment.merge(Serialized::default(key, value));
        self
    }

    pub fn load(self) -> Result<Config> {
        let config: Config = self.figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        config.resolve_paths()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
