use crate::CommandSpec;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::instrument;

/// The captured result of a process that ran to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn new(exit_code: Option<i32>, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self { exit_code, stdout: stdout.into(), stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turns a non-zero exit (or death by signal) into an
    /// [`Exited`](ErrorKind::Exited) error, handing back the output otherwise.
    pub fn check(self) -> Result<Self> {
        if !self.success() {
            exn::bail!(ErrorKind::Exited(self.exit_code));
        }
        Ok(self)
    }
}

/// Executes a [`CommandSpec`] and waits for it to finish.
///
/// Implementations block the calling thread for the whole lifetime of the
/// child process. Failing to *start* the process is an `Err`; a process that
/// started and then failed is an `Ok` whose [`ProcessOutput`] reports the
/// exit code, and it is up to the caller to [`check`](ProcessOutput::check)
/// it.
pub trait ProcessRunner {
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput> {
        (**self).run(command, working_dir)
    }
}

/// Runs commands as real child processes of the current process.
///
/// Standard input is closed, standard output and error are captured, and the
/// environment is inherited unchanged. No timeout is applied.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Resolve the program to something the OS can execute, so that a missing
    /// launcher or extractor is reported as [`NotFound`](ErrorKind::NotFound)
    /// rather than an opaque spawn failure.
    ///
    /// A relative path such as `bin/wine` is taken relative to `working_dir`,
    /// matching what the spawned child would see.
    fn resolve(command: &CommandSpec, working_dir: &Path) -> Result<PathBuf> {
        let program = command.program();
        if command.is_program_path() {
            let path = working_dir.join(program);
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.display().to_string()));
            }
            return Ok(path);
        }
        which::which(program).or_raise(|| ErrorKind::NotFound(program.to_string_lossy().into_owned()))
    }
}

impl ProcessRunner for SystemRunner {
    #[instrument(skip_all, fields(program = %command.program().to_string_lossy()))]
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput> {
        let program = Self::resolve(command, working_dir)?;
        tracing::debug!(%command, cwd = %working_dir.display(), "Spawning process");
        let output = Command::new(&program)
            .args(command.arguments())
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .or_raise(|| ErrorKind::Spawn(program.display().to_string()))?;
        let output = ProcessOutput::new(output.status.code(), output.stdout, output.stderr);
        tracing::debug!(exit_code = ?output.exit_code, "Process finished");
        if !output.stdout.is_empty() {
            tracing::trace!(stdout = %String::from_utf8_lossy(&output.stdout), "Captured standard output");
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_on_zero() {
        let output = ProcessOutput::new(Some(0), b"done".to_vec(), Vec::new());
        assert!(output.success());
        assert_eq!(output.check().unwrap().stdout, b"done");
    }

    #[test]
    fn check_rejects_non_zero_and_signals() {
        let err = ProcessOutput::new(Some(2), Vec::new(), b"boom".to_vec()).check().unwrap_err();
        assert_eq!(*err, ErrorKind::Exited(Some(2)));
        let err = ProcessOutput::new(None, Vec::new(), Vec::new()).check().unwrap_err();
        assert_eq!(*err, ErrorKind::Exited(None));
    }

    #[test]
    fn missing_bare_program_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let command = CommandSpec::new("autodrome-definitely-not-a-real-launcher").arg("x");
        let err = SystemRunner.run(&command, temp_dir.path()).unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn missing_program_path_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let command = CommandSpec::new(temp_dir.path().join("scs_extractor.exe"));
        let err = SystemRunner.run(&command, temp_dir.path()).unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_code() {
        let temp_dir = tempfile::tempdir().unwrap();
        let command = CommandSpec::new("sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let output = SystemRunner.run(&command, temp_dir.path()).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, b"hello\n");
        assert_eq!(output.stderr, b"oops\n");
        assert!(output.check().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("def.scs"), b"archive").unwrap();
        let command = CommandSpec::new("sh").args(["-c", "test -f def.scs"]);
        let output = SystemRunner.run(&command, temp_dir.path()).unwrap();
        assert!(output.success());
    }
}
