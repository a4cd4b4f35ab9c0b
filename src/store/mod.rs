//! Seen-ID stores for delivery deduplication
//!
//! A store remembers which item IDs have already been delivered. The file
//! backing is a plain JSON array in insertion order, capped FIFO, written
//! atomically via a temp file rename.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A set of already-delivered item IDs
pub trait SeenStore {
    fn contains(&self, id: &str) -> bool;
    /// Record an ID; a repeat insert is a no-op
    fn add(&mut self, id: &str);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store, used in tests and for features that only dedup
/// within one run
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: Vec<String>,
    index: HashSet<String>,
}

impl SeenStore for MemoryStore {
    fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    fn add(&mut self, id: &str) {
        if self.index.insert(id.to_string()) {
            self.ids.push(id.to_string());
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// File-backed store holding at most `capacity` IDs, oldest evicted first
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    capacity: usize,
    ids: Vec<String>,
    index: HashSet<String>,
}

impl JsonFileStore {
    /// Open a store file. A missing file starts empty; a corrupt file is
    /// logged and treated as empty rather than blocking the run.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "seen store corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        let index = ids.iter().cloned().collect();
        Self {
            path,
            capacity,
            ids,
            index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Evict to capacity and write the ID list atomically
    pub fn persist(&mut self) -> anyhow::Result<()> {
        while self.ids.len() > self.capacity {
            let evicted = self.ids.remove(0);
            self.index.remove(&evicted);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(&self.ids)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SeenStore for JsonFileStore {
    fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    fn add(&mut self, id: &str) {
        if self.index.insert(id.to_string()) {
            self.ids.push(id.to_string());
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_dedups() {
        let mut store = MemoryStore::default();
        store.add("a");
        store.add("a");
        store.add("b");
        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert!(!store.contains("c"));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news_seen.json");

        let mut store = JsonFileStore::open(&path, 100);
        assert!(store.is_empty());
        store.add("id1");
        store.add("id2");
        store.persist().unwrap();

        let reopened = JsonFileStore::open(&path, 100);
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("id1"));
    }

    #[test]
    fn test_file_store_fifo_eviction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");

        let mut store = JsonFileStore::open(&path, 3);
        for id in ["a", "b", "c", "d", "e"] {
            store.add(id);
        }
        store.persist().unwrap();

        let reopened = JsonFileStore::open(&path, 3);
        assert_eq!(reopened.len(), 3);
        assert!(!reopened.contains("a"));
        assert!(!reopened.contains("b"));
        assert!(reopened.contains("e"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path, 10);
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/seen.json");

        let mut store = JsonFileStore::open(&path, 10);
        store.add("x");
        store.persist().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");

        let mut store = JsonFileStore::open(&path, 10);
        store.add("x");
        store.persist().unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}
