//! Scripted process runner for testing.

use crate::error::{ErrorKind, Result};
use crate::{CommandSpec, ProcessOutput, ProcessRunner};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&CommandSpec, &Path) -> Result<ProcessOutput> + Send + Sync>;

/// A [`ProcessRunner`] that never spawns anything.
///
/// Every invocation is recorded and then answered by a handler closure, which
/// may also touch the filesystem to imitate what the real program would have
/// produced. Ideal for asserting how many processes a piece of code *would*
/// have started.
///
/// # Examples
///
/// ```
/// use autodrome_process::{CommandSpec, MockRunner, ProcessRunner};
/// use std::path::Path;
///
/// let runner = MockRunner::exiting(0);
/// let output = runner.run(&CommandSpec::new("scs_extractor.exe"), Path::new("/")).unwrap();
/// assert!(output.success());
/// assert_eq!(runner.calls(), 1);
/// ```
pub struct MockRunner {
    handler: Handler,
    invocations: Mutex<Vec<(CommandSpec, PathBuf)>>,
}

impl MockRunner {
    /// Answer every invocation with the output produced by `handler`.
    ///
    /// The handler receives the command and the working directory it would
    /// have run in.
    pub fn new(handler: impl Fn(&CommandSpec, &Path) -> ProcessOutput + Send + Sync + 'static) -> Self {
        Self::fallible(move |command, cwd| Ok(handler(command, cwd)))
    }

    /// Like [`new`](Self::new), but the handler may also fail to "launch".
    pub fn fallible(handler: impl Fn(&CommandSpec, &Path) -> Result<ProcessOutput> + Send + Sync + 'static) -> Self {
        Self { handler: Box::new(handler), invocations: Mutex::new(Vec::new()) }
    }

    /// Every invocation exits with `code` and produces no output.
    pub fn exiting(code: i32) -> Self {
        Self::new(move |_, _| ProcessOutput::new(Some(code), Vec::new(), Vec::new()))
    }

    /// Every invocation fails as if the program did not exist.
    pub fn unlaunchable() -> Self {
        Self::fallible(|command, _| {
            Err(exn::Exn::from(ErrorKind::NotFound(command.program().to_string_lossy().into_owned())))
        })
    }

    /// Number of processes that would have been started so far.
    pub fn calls(&self) -> usize {
        self.lock().len()
    }

    /// Commands received so far, in order, with their working directories.
    pub fn invocations(&self) -> Vec<(CommandSpec, PathBuf)> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(CommandSpec, PathBuf)>> {
        // A poisoned lock only means a handler panicked mid-test; the
        // recorded invocations are still meaningful.
        self.invocations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput> {
        self.lock().push((command.clone(), working_dir.to_path_buf()));
        (self.handler)(command, working_dir)
    }
}
