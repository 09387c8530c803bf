//! Directory creation and ownership handover.

use std::path::{Path, PathBuf};

use dockhand_core::dirs::{DirectorySpec, OwnerSpec};
use tokio::process::Command;

use crate::error::{EntrypointError, EntrypointResult};

const CHOWN_BIN: &str = "chown";

#[derive(Debug, thiserror::Error)]
pub enum OwnershipError {
    #[error("failed to run chown: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("chown exited with code {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// What [`prepare_directories`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub created: Vec<PathBuf>,
    /// Paths whose recursive ownership change failed (logged, not fatal).
    pub chown_failed: Vec<PathBuf>,
}

/// Create every directory in `spec` (with parents) and, if an owner is
/// configured, hand the tree over with `chown -R`.
///
/// Creation failures are fatal. Ownership failures are common in rootless
/// containers and are only logged.
pub async fn prepare_directories(spec: &DirectorySpec) -> EntrypointResult<DirectoryReport> {
    let mut report = DirectoryReport::default();

    for path in &spec.paths {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| EntrypointError::CreateDir {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), "Directory ready");
        report.created.push(path.clone());

        let Some(owner) = &spec.owner else {
            continue;
        };
        match change_owner(path, owner).await {
            Ok(()) => tracing::info!(path = %path.display(), %owner, "Ownership changed"),
            Err(e) => {
                tracing::warn!(path = %path.display(), %owner, error = %e, "Could not change ownership");
                report.chown_failed.push(path.clone());
            }
        }
    }

    Ok(report)
}

async fn change_owner(path: &Path, owner: &OwnerSpec) -> Result<(), OwnershipError> {
    let output = Command::new(CHOWN_BIN)
        .arg("-R")
        .arg(owner.to_string())
        .arg(path)
        .output()
        .await
        .map_err(OwnershipError::Spawn)?;

    if output.status.success() {
        Ok(())
    } else {
        Err(OwnershipError::Failed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
