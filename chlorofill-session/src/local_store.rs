//! Device-local key/value storage.
//!
//! Values are strings, as in a browser's local storage. Reads and writes are
//! synchronous and applied in call order.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use chlorofill_core::LocalStoreError;
use uuid::Uuid;

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// In-memory store, for tests and for runs without a storage path.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file.
///
/// The file is read on every access and replaced atomically on every
/// mutation, so several processes sharing a path see each other's writes.
/// An unparsable file reads as empty and is overwritten by the next write.
#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole map. A file that does not parse is logged and read as
    /// empty; the next mutation replaces it.
    fn load(&self) -> Result<BTreeMap<String, String>, LocalStoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(io_error)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "local storage file corrupt, starting from empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Write to a sibling temp file, fsync, then rename over the target.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), LocalStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let contents = serde_json::to_string_pretty(entries).map_err(|e| LocalStoreError::Io {
            reason: e.to_string(),
        })?;

        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = self.path.with_file_name(
            self.path
                .file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        let written = std::fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| std::fs::rename(&temp_path, &self.path)) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_error(e));
        }
        Ok(())
    }

    fn mutate(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), LocalStoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

fn io_error(e: std::io::Error) -> LocalStoreError {
    LocalStoreError::Io {
        reason: e.to_string(),
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryLocalStore::with_entries([("favoriteMealIds", "[\"1\"]")]);
        assert_eq!(store.get("favoriteMealIds").unwrap().as_deref(), Some("[\"1\"]"));
        store.remove("favoriteMealIds").unwrap();
        store.remove("favoriteMealIds").unwrap();
        assert!(!store.contains("favoriteMealIds"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileLocalStore::new(&path);
        assert_eq!(store.get("preferred_theme").unwrap(), None);
        store.set("preferred_theme", "light").unwrap();
        store.set("favoriteMealIds", "[]").unwrap();

        let reopened = FileLocalStore::new(&path);
        assert_eq!(reopened.get("preferred_theme").unwrap().as_deref(), Some("light"));
        reopened.remove("preferred_theme").unwrap();
        assert_eq!(store.get("preferred_theme").unwrap(), None);
        assert_eq!(store.get("favoriteMealIds").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_file_reads_empty_and_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileLocalStore::new(&path);
        assert_eq!(store.get("favoriteMealIds").unwrap(), None);
        store.set("favoriteMealIds", "[\"52772\"]").unwrap();

        let reopened = FileLocalStore::new(&path);
        assert_eq!(
            reopened.get("favoriteMealIds").unwrap().as_deref(),
            Some("[\"52772\"]")
        );
        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn test_remove_on_corrupt_file_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = FileLocalStore::new(&path);
        store.remove("preferred_theme").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = FileLocalStore::new(&path);
        store.set("preferred_theme", "dark").unwrap();
        store.set("preferred_theme", "light").unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["storage.json".to_string()]);
    }
}
