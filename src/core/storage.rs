use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::{Result, StoreError};

pub const USER_KEY: &str = "@declutter/user";
pub const ROOMS_KEY: &str = "@declutter/rooms";
pub const STATS_KEY: &str = "@declutter/stats";
pub const SETTINGS_KEY: &str = "@declutter/settings";
pub const API_KEY_KEY: &str = "@declutter/api_key";
pub const MASCOT_KEY: &str = "@declutter/mascot";
pub const COLLECTION_KEY: &str = "@declutter/collection";
pub const COLLECTION_STATS_KEY: &str = "@declutter/collection_stats";

pub const ALL_KEYS: &[&str] = &[
    USER_KEY,
    ROOMS_KEY,
    STATS_KEY,
    SETTINGS_KEY,
    API_KEY_KEY,
    MASCOT_KEY,
    COLLECTION_KEY,
    COLLECTION_STATS_KEY,
];

/// String-keyed blob storage. Values are whole JSON documents.
pub trait KeyValueStorage: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key under a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(FileStorage { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .trim_start_matches('@')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Invalid("memory storage lock poisoned".to_string()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock_entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock_entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().join("storage")).unwrap();

        assert!(storage.get(ROOMS_KEY).unwrap().is_none());
        storage.set(ROOMS_KEY, "[]").unwrap();
        assert_eq!(storage.get(ROOMS_KEY).unwrap().as_deref(), Some("[]"));

        storage.remove(ROOMS_KEY).unwrap();
        assert!(storage.get(ROOMS_KEY).unwrap().is_none());
        storage.remove(ROOMS_KEY).unwrap();
    }

    #[test]
    fn test_file_names_are_sanitized() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().to_path_buf()).unwrap();
        storage.set(COLLECTION_STATS_KEY, "{}").unwrap();
        assert!(temp.path().join("declutter_collection_stats.json").exists());
    }

    #[test]
    fn test_memory_storage_clones_share() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set(USER_KEY, "{}").unwrap();
        assert_eq!(other.get(USER_KEY).unwrap().as_deref(), Some("{}"));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_poisoned_memory_storage_reports_errors() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        let _ = std::thread::spawn(move || {
            let _guard = other.entries.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(storage.set(USER_KEY, "{}"), Err(StoreError::Invalid(_))));
        assert!(matches!(storage.remove(USER_KEY), Err(StoreError::Invalid(_))));
        assert!(storage.get(USER_KEY).is_err());
    }
}
