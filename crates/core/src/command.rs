//! The final workload command.

use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Interpreter used when the container is started without a command.
pub const DEFAULT_SHELL: &str = "bash";

/// Program and arguments taken verbatim from the entrypoint's argv.
///
/// Stored as [`OsString`]: argv entries are arbitrary bytes and are passed
/// on untouched, whether or not they are valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl WorkloadCommand {
    /// Build from the argument vector (without the entrypoint's own argv[0]).
    ///
    /// An empty vector falls back to an interactive shell.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        match args.next() {
            Some(program) => Self {
                program,
                args: args.collect(),
            },
            None => Self {
                program: DEFAULT_SHELL.into(),
                args: Vec::new(),
            },
        }
    }

    /// Whether the program's file name contains `server_binary`
    /// (`/usr/sbin/mysqld`, `mysqld-debug` and `mysqld` all match `mysqld`).
    pub fn is_server(&self, server_binary: &str) -> bool {
        if server_binary.is_empty() {
            return false;
        }
        Path::new(&self.program)
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.contains(server_binary))
    }

    /// A copy of this command with one extra trailing argument.
    pub fn with_arg(&self, arg: &str) -> Self {
        let mut args = self.args.clone();
        args.push(arg.into());
        Self {
            program: self.program.clone(),
            args,
        }
    }
}

impl std::fmt::Display for WorkloadCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
