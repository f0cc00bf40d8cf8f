//! Durable key/value storage behind the local cache
//!
//! Each collection persists as one serialized JSON array under its storage
//! key. Backends are synchronous; the cache exposes them through async
//! methods.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Raw persistence for serialized collections
pub trait Storage: Send + Sync {
    /// Read the document stored under `key`, `None` if never written
    fn load(&self, key: &str) -> crate::Result<Option<String>>;

    /// Replace the document stored under `key`
    fn store(&self, key: &str, contents: &str) -> crate::Result<()>;
}

/// One `<key>.json` file per collection inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`; path separators in keys are flattened
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> crate::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn store(&self, key: &str, contents: &str) -> crate::Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a truncated array behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;

        tracing::trace!("Stored {} bytes to {:?}", contents.len(), path);
        Ok(())
    }
}

/// In-process storage with an injectable write failure
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `store` fail, as a full disk would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stored document for `key`, bypassing the cache
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Put an arbitrary document under `key`, e.g. a corrupted one
    pub fn insert_raw(&self, key: &str, contents: &str) {
        self.lock().insert(key.to_string(), contents.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn store(&self, key: &str, contents: &str) -> crate::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(crate::SyncError::Storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage quota exceeded",
            )));
        }
        self.insert_raw(key, contents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip() {
        let temp = assert_fs::TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().join("data"));

        assert!(storage.load("fh_shopping").unwrap().is_none());

        storage.store("fh_shopping", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            storage.load("fh_shopping").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert!(temp.path().join("data/fh_shopping.json").exists());
        assert!(!temp.path().join("data/fh_shopping.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_flattens_separators() {
        let storage = FileStorage::new("/tmp/hub");
        assert_eq!(
            storage.path_for("../etc/passwd"),
            PathBuf::from("/tmp/hub/___etc_passwd.json")
        );
    }

    #[test]
    fn test_memory_storage_write_failure() {
        let storage = MemoryStorage::new();
        storage.store("k", "[]").unwrap();

        storage.set_fail_writes(true);
        assert!(storage.store("k", "[1]").is_err());
        assert_eq!(storage.raw("k").as_deref(), Some("[]"));
    }
}
