//! Ordered queue of SQL dumps awaiting load.

use std::path::{Path, PathBuf};

use crate::classify::EntryKind;

/// How a queued dump is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
}

/// A single SQL dump in the load queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedFile {
    pub path: PathBuf,
    pub compression: Compression,
}

impl QueuedFile {
    /// Build a queue entry for a classified path. Returns `None` for kinds
    /// that are not SQL dumps.
    pub fn from_kind(path: &Path, kind: EntryKind) -> Option<Self> {
        let compression = match kind {
            EntryKind::Sql => Compression::Plain,
            EntryKind::CompressedSql => Compression::Gzip,
            EntryKind::Script | EntryKind::Other => return None,
        };
        Some(Self {
            path: path.to_path_buf(),
            compression,
        })
    }
}

/// SQL dumps in directory-listing order.
///
/// The queue is consumed exactly once through [`SqlQueue::take`], which
/// leaves it empty so nothing can be loaded twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlQueue {
    files: Vec<QueuedFile>,
}

impl SqlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: QueuedFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedFile> {
        self.files.iter()
    }

    /// Remove and return every queued file, in order.
    pub fn take(&mut self) -> Vec<QueuedFile> {
        std::mem::take(&mut self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_kind_maps_compression() {
        let plain = QueuedFile::from_kind(Path::new("a.sql"), EntryKind::Sql).expect("sql");
        assert_eq!(plain.compression, Compression::Plain);

        let gz = QueuedFile::from_kind(Path::new("b.sql.gz"), EntryKind::CompressedSql)
            .expect("sql.gz");
        assert_eq!(gz.compression, Compression::Gzip);

        assert!(QueuedFile::from_kind(Path::new("c.sh"), EntryKind::Script).is_none());
        assert!(QueuedFile::from_kind(Path::new("d.txt"), EntryKind::Other).is_none());
    }

    #[test]
    fn take_preserves_order_and_empties_queue() {
        let mut queue = SqlQueue::new();
        queue.push(QueuedFile::from_kind(Path::new("a.sql"), EntryKind::Sql).unwrap());
        queue.push(QueuedFile::from_kind(Path::new("b.sql.gz"), EntryKind::CompressedSql).unwrap());
        assert_eq!(queue.len(), 2);

        let taken = queue.take();
        assert_eq!(taken[0].path, PathBuf::from("a.sql"));
        assert_eq!(taken[1].path, PathBuf::from("b.sql.gz"));

        assert!(queue.is_empty());
        assert!(queue.take().is_empty());
    }
}
