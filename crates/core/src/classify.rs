//! Classification of files found in the entrypoint directories.
//!
//! Both the init-scripts directory and the entrypoint directory are scanned
//! in lexical filename order. Each entry is classified by its extension:
//! shell scripts run immediately, SQL dumps (plain or gzip-compressed) are
//! queued for loading, everything else is skipped.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

pub const SCRIPT_SUFFIX: &str = ".sh";
pub const SQL_SUFFIX: &str = ".sql";
pub const COMPRESSED_SQL_SUFFIX: &str = ".sql.gz";

/// What to do with a file found during a directory scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Shell script, executed synchronously.
    Script,
    /// Plain SQL dump, queued.
    Sql,
    /// Gzip-compressed SQL dump, queued.
    CompressedSql,
    /// Anything else; logged and ignored.
    Other,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Sql => "sql",
            Self::CompressedSql => "sql.gz",
            Self::Other => "other",
        }
    }
}

/// Classify a path by its filename suffix.
pub fn classify(path: &Path) -> EntryKind {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return EntryKind::Other;
    };

    if name.ends_with(SCRIPT_SUFFIX) {
        EntryKind::Script
    } else if name.ends_with(COMPRESSED_SQL_SUFFIX) {
        EntryKind::CompressedSql
    } else if name.ends_with(SQL_SUFFIX) {
        EntryKind::Sql
    } else {
        EntryKind::Other
    }
}

/// List the files directly inside `dir`, sorted lexically by filename.
///
/// A missing directory yields an empty list. A path that cannot be listed
/// (not a directory, no read permission) is logged and also yields an empty
/// list. Subdirectories are not descended into and are left out; symlinks to
/// files are included.
pub async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Directory does not exist; nothing to scan");
            return Ok(Vec::new());
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot list directory; skipping it");
            return Ok(Vec::new());
        }
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(|source| CoreError::Io {
        path: dir.to_path_buf(),
        source,
    })? {
        let path = entry.path();
        // Follows symlinks, unlike `DirEntry::file_type`.
        let is_file = tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file());
        if is_file {
            entries.push(path);
        }
    }

    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}
