use std::path::PathBuf;

use dockhand_core::error::CoreError;

use crate::scripts::ScriptError;
use crate::supervisor::ChildRole;

/// Fatal entrypoint errors. Any of these aborts startup before the workload
/// is launched (or, for [`EntrypointError::Wait`], after it was).
#[derive(Debug, thiserror::Error)]
pub enum EntrypointError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {role} (pid {pid}): {source}")]
    Wait {
        role: ChildRole,
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("A {role} process (pid {pid}) is already supervised")]
    ChildAlreadyTracked { role: ChildRole, pid: u32 },

    #[error("No child process is supervised")]
    NoChild,
}

pub type EntrypointResult<T> = Result<T, EntrypointError>;
