//! Entrypoint directory scan: run scripts now, queue SQL dumps for later.

use std::path::Path;

use dockhand_core::classify::{classify, sorted_entries, EntryKind};
use dockhand_core::queue::{QueuedFile, SqlQueue};

use crate::error::EntrypointResult;
use crate::scripts::ScriptRunner;

/// Scan `dir` in lexical order. Scripts run immediately (fatal on failure),
/// `.sql` and `.sql.gz` files are queued, anything else is skipped.
pub async fn collect_entrypoint_dir(
    runner: &ScriptRunner,
    dir: &Path,
) -> EntrypointResult<SqlQueue> {
    let mut queue = SqlQueue::new();

    for path in sorted_entries(dir).await? {
        let kind = classify(&path);
        if kind == EntryKind::Script {
            runner.run(&path).await?;
            continue;
        }

        match QueuedFile::from_kind(&path, kind) {
            Some(file) => {
                tracing::info!(file = %path.display(), kind = kind.as_str(), "Queued SQL file");
                queue.push(file);
            }
            None => {
                tracing::info!(file = %path.display(), "Ignoring unsupported file");
            }
        }
    }

    Ok(queue)
}
