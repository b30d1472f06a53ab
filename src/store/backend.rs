// ABOUTME: Durable key-value backends for clock snapshots
// ABOUTME: File-per-key directory store and a shared in-memory store

use crate::error::Error;
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{self, Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// String key-value persistence used by [`ClockStore`](super::ClockStore)
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`
    ///
    /// Keys must be plain file names: non-empty, not `.` or `..`, and free
    /// of path separators.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.chars().any(path::is_separator) {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Uniquely named sibling, then rename: concurrent writers never share
        // a temp file and readers never see a partial record
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`, bypassing the trait
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Insert a raw value, e.g. to seed a corrupted record in tests
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().insert(key.into(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("clock").unwrap(), None);

        store.set("clock", "{\"a\":1}").unwrap();
        assert_eq!(store.get("clock").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.path_for("clock").unwrap().exists());

        store.set("clock", "{}").unwrap();
        assert_eq!(store.get("clock").unwrap().as_deref(), Some("{}"));

        store.remove("clock").unwrap();
        assert_eq!(store.get("clock").unwrap(), None);
        store.remove("clock").unwrap();
    }

    #[test]
    fn test_file_store_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(&blocker);
        assert!(store.set("clock", "{}").is_err());
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        for key in ["", ".", "..", "../escape", "nested/key", "/abs"] {
            assert!(matches!(store.set(key, "{}"), Err(Error::InvalidKey(_))), "accepted {key:?}");
            assert!(matches!(store.get(key), Err(Error::InvalidKey(_))));
            assert!(matches!(store.remove(key), Err(Error::InvalidKey(_))));
        }
        assert!(!dir.path().join("escape.json").exists());
        assert!(!dir.path().join("state").exists());
    }

    #[test]
    fn test_file_store_concurrent_writers_publish_whole_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let records: Vec<String> = (0..4)
            .map(|i| format!("{{\"writer\":{i},\"pad\":\"{}\"}}", "x".repeat(64 * 1024)))
            .collect();

        std::thread::scope(|scope| {
            for record in &records {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..20 {
                        store.set("clock", record).unwrap();
                    }
                });
            }
        });

        let published = store.get("clock").unwrap().unwrap();
        assert!(records.contains(&published), "record was interleaved");

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temp files left behind");
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));

        other.remove("k").unwrap();
        assert_eq!(store.raw("k"), None);
    }
}
