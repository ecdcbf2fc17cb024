//! Temporary placement of the extractor inside the simulator's install folder.
//!
//! The extractor resolves archives relative to where it lives, so it has to
//! be copied next to them before every run. The copy must not outlive the
//! run: the install folder belongs to the game, not to us.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// A copy of an executable that is deleted when dropped.
///
/// Dropping happens on every exit path, including early returns and panics
/// unwinding through the owner. A failed removal is logged and otherwise
/// ignored, so it can never replace the result of the work done in between.
#[derive(Debug)]
pub struct StagedExecutable {
    path: PathBuf,
}

impl StagedExecutable {
    /// Copy `source` into `destination_dir`, keeping its file name.
    ///
    /// Fails if a file of that name is already present in `destination_dir`.
    pub fn stage(source: &Path, destination_dir: &Path) -> Result<Self> {
        let file_name = source.file_name().ok_or_raise(|| ErrorKind::Staging(source.to_path_buf()))?;
        let path = destination_dir.join(file_name);
        // Whatever already sits at the target belongs to someone else (or is
        // the source itself); dropping the guard would delete it.
        if path.symlink_metadata().is_ok() {
            tracing::warn!(staged = %path.display(), "Refusing to stage over an existing file");
            exn::bail!(ErrorKind::Staging(path));
        }
        std::fs::copy(source, &path).or_raise(|| ErrorKind::Staging(path.clone()))?;
        tracing::debug!(source = %source.display(), staged = %path.display(), "Staged executable");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedExecutable {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(staged = %self.path.display(), "Removed staged executable"),
            Err(e) => tracing::warn!(staged = %self.path.display(), error = %e, "Failed to remove staged executable"),
        }
    }
}

/// Run `body` with `source` copied into `destination_dir`, removing the copy
/// again once `body` has finished, however it finished.
///
/// Only a failure to stage is returned as an error; whatever `body` returns
/// (including its own errors) is handed back untouched.
pub fn with_staged_executable<T>(
    source: &Path,
    destination_dir: &Path,
    body: impl FnOnce(&Path) -> T,
) -> Result<T> {
    let staged = StagedExecutable::stage(source, destination_dir)?;
    Ok(body(staged.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let bundle = temp_dir.path().join("bin");
        let game = temp_dir.path().join("game");
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::create_dir_all(&game).unwrap();
        let source = bundle.join("scs_extractor.exe");
        std::fs::write(&source, b"MZ extractor").unwrap();
        (temp_dir, source, game)
    }

    #[test]
    fn staged_copy_exists_only_during_body() {
        let (_temp, source, game) = setup();
        let seen = with_staged_executable(&source, &game, |staged| {
            assert_eq!(staged, game.join("scs_extractor.exe"));
            std::fs::read(staged).unwrap()
        })
        .unwrap();
        assert_eq!(seen, b"MZ extractor");
        assert!(!game.join("scs_extractor.exe").exists());
        assert!(source.exists());
    }

    #[test]
    fn removed_when_body_fails() {
        let (_temp, source, game) = setup();
        let result: Result<std::result::Result<(), &str>> =
            with_staged_executable(&source, &game, |_| Err("extractor exited with 1"));
        assert_eq!(result.unwrap(), Err("extractor exited with 1"));
        assert!(!game.join("scs_extractor.exe").exists());
    }

    #[test]
    fn removed_when_body_panics() {
        let (_temp, source, game) = setup();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<()> = with_staged_executable(&source, &game, |_| panic!("extractor crashed"));
        }));
        assert!(outcome.is_err());
        assert!(!game.join("scs_extractor.exe").exists());
    }

    #[test]
    fn removal_failure_does_not_mask_result() {
        let (_temp, source, game) = setup();
        let result = with_staged_executable(&source, &game, |staged| {
            // Something else already deleted it.
            std::fs::remove_file(staged).unwrap();
            42
        });
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn missing_source_is_staging_failure() {
        let (_temp, source, game) = setup();
        std::fs::remove_file(&source).unwrap();
        let mut called = false;
        let err = with_staged_executable(&source, &game, |_| called = true).unwrap_err();
        assert_eq!(*err, ErrorKind::Staging(game.join("scs_extractor.exe")));
        assert!(!called);
    }

    #[test]
    fn leaves_existing_file_untouched() {
        let (_temp, source, game) = setup();
        let existing = game.join("scs_extractor.exe");
        std::fs::write(&existing, b"installed by the player").unwrap();
        let mut called = false;
        let err = with_staged_executable(&source, &game, |_| called = true).unwrap_err();
        assert_eq!(*err, ErrorKind::Staging(existing.clone()));
        assert!(!called);
        assert_eq!(std::fs::read(&existing).unwrap(), b"installed by the player");
    }

    #[test]
    fn refuses_to_stage_onto_itself() {
        let (_temp, source, _game) = setup();
        let bundle = source.parent().unwrap().to_path_buf();
        let err = StagedExecutable::stage(&source, &bundle).unwrap_err();
        assert!(matches!(*err, ErrorKind::Staging(_)));
        assert!(source.exists());
    }
}
