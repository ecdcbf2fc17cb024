use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

/// The shape of a single external invocation: a program plus its arguments.
///
/// A `CommandSpec` is inert data. Turning it into a running process is the
/// job of a [`ProcessRunner`](crate::ProcessRunner), which also decides the
/// working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn arguments(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsString::as_os_str)
    }

    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<&OsStr> {
        std::iter::once(self.program()).chain(self.arguments()).collect()
    }

    /// Whether the program is a path (relative or absolute) rather than a
    /// bare name to be looked up in `PATH`.
    ///
    /// [`SystemRunner`](crate::SystemRunner) resolves a relative program path
    /// against the working directory of the run, not the current directory.
    pub fn is_program_path(&self) -> bool {
        Path::new(&self.program).components().count() > 1 || Path::new(&self.program).is_absolute()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in self.argv() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            let part = part.to_string_lossy();
            if part.is_empty() || part.contains(char::is_whitespace) {
                write!(f, "{part:?}")?;
            } else {
                f.write_str(&part)?;
            }
        }
        Ok(())
    }
}
