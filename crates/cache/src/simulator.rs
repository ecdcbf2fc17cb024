use std::path::{Path, PathBuf};

/// Name of the cache directory created inside the simulator's mod directory.
pub const CACHE_DIR_NAME: &str = "cache";
/// Name of the directory holding text map files inside the mod directory.
pub const MAP_DIR_NAME: &str = "map";

/// The parts of a simulator install this crate needs to know about.
///
/// Starting and stopping the game is somebody else's job; all that matters
/// here is where the game's archives live and where mod data may be written.
pub trait Simulator {
    /// Install folder containing the `.scs` archives.
    fn root_game_folder(&self) -> &Path;
    /// Writable mod/data directory. The archive cache lives inside it.
    fn mod_dir(&self) -> &Path;

    fn cache_dir(&self) -> PathBuf {
        self.mod_dir().join(CACHE_DIR_NAME)
    }

    /// Location of a text map file, e.g. `indy500.txt`.
    fn map_file(&self, name: &str) -> PathBuf {
        self.mod_dir().join(MAP_DIR_NAME).join(name)
    }
}

/// A [`Simulator`] described by nothing more than its two folders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatorPaths {
    pub root_game_folder: PathBuf,
    pub mod_dir: PathBuf,
}

impl SimulatorPaths {
    pub fn new(root_game_folder: impl Into<PathBuf>, mod_dir: impl Into<PathBuf>) -> Self {
        Self { root_game_folder: root_game_folder.into(), mod_dir: mod_dir.into() }
    }
}

impl Simulator for SimulatorPaths {
    fn root_game_folder(&self) -> &Path {
        &self.root_game_folder
    }

    fn mod_dir(&self) -> &Path {
        &self.mod_dir
    }
}

impl<S: Simulator + ?Sized> Simulator for &S {
    fn root_game_folder(&self) -> &Path {
        (**self).root_game_folder()
    }

    fn mod_dir(&self) -> &Path {
        (**self).mod_dir()
    }
}
