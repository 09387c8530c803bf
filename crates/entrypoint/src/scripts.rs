//! Init script execution.
//!
//! Scripts run one at a time through the configured shell, inheriting the
//! container's environment and stdio. A failing script is fatal: the loop
//! stops at the first error and the entrypoint never launches the workload.

use std::path::{Path, PathBuf};

use dockhand_core::classify::{classify, sorted_entries, EntryKind};
use tokio::process::Command;

use crate::error::EntrypointResult;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to run script {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Script {} failed with exit code {exit_code}", path.display())]
    ExecutionFailed { path: PathBuf, exit_code: i32 },
}

/// Runs `.sh` files through a shell interpreter.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    shell: String,
}

impl ScriptRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run one script synchronously in its own process.
    pub async fn run(&self, path: &Path) -> Result<(), ScriptError> {
        tracing::info!(script = %path.display(), "Running script");

        let status = Command::new(&self.shell)
            .arg(path)
            .status()
            .await
            .map_err(|source| ScriptError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }

        let exit_code = crate::supervisor::exit_code(status);
        tracing::error!(script = %path.display(), exit_code, "Script failed");
        Err(ScriptError::ExecutionFailed {
            path: path.to_path_buf(),
            exit_code,
        })
    }
}

/// Run every `.sh` file in `dir` in lexical order, skipping other files.
///
/// Returns the number of scripts executed. A missing directory is a no-op.
pub async fn run_init_scripts(runner: &ScriptRunner, dir: &Path) -> EntrypointResult<usize> {
    let mut executed = 0;
    for path in sorted_entries(dir).await? {
        match classify(&path) {
            EntryKind::Script => {
                runner.run(&path).await?;
                executed += 1;
            }
            kind => {
                tracing::info!(file = %path.display(), kind = kind.as_str(), "Ignoring non-script file");
            }
        }
    }
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::EntrypointError;

    fn write_script(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), format!("#!/bin/sh\n{body}\n")).expect("write script");
    }

    #[tokio::test]
    async fn runs_scripts_in_lexical_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("order.log");
        let log = log.display();

        write_script(dir.path(), "02-b.sh", &format!("echo b >> {log}"));
        write_script(dir.path(), "01-a.sh", &format!("echo a >> {log}"));
        write_script(dir.path(), "10-c.sh", &format!("echo c >> {log}"));
        std::fs::write(dir.path().join("00-notes.txt"), "not a script").expect("write");

        let executed = run_init_scripts(&ScriptRunner::new("sh"), dir.path())
            .await
            .expect("run");
        assert_eq!(executed, 3);

        let order = std::fs::read_to_string(dir.path().join("order.log")).expect("read log");
        assert_eq!(order, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn failing_script_aborts_remaining() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join("after.marker");

        write_script(dir.path(), "01-fail.sh", "exit 3");
        write_script(dir.path(), "02-after.sh", &format!("touch {}", marker.display()));

        let result = run_init_scripts(&ScriptRunner::new("sh"), dir.path()).await;
        assert_matches!(
            result,
            Err(EntrypointError::Script(ScriptError::ExecutionFailed { exit_code: 3, .. }))
        );
        assert!(!marker.exists(), "scripts after a failure must not run");
    }

    #[tokio::test]
    async fn scripts_inherit_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_script(dir.path(), "check.sh", r#"test -n "$PATH""#);
        ScriptRunner::new("sh")
            .run(&dir.path().join("check.sh"))
            .await
            .expect("PATH should be visible to scripts");
    }

    #[tokio::test]
    async fn missing_dir_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let executed = run_init_scripts(&ScriptRunner::new("sh"), &dir.path().join("absent"))
            .await
            .expect("run");
        assert_eq!(executed, 0);
    }

    #[tokio::test]
    async fn missing_shell_is_spawn_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_script(dir.path(), "a.sh", "true");
        let result = ScriptRunner::new("/nonexistent/shell")
            .run(&dir.path().join("a.sh"))
            .await;
        assert_matches!(result, Err(ScriptError::Spawn { .. }));
    }
}
