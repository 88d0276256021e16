use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use super::{PageSet, StoreError};

/// Key-value storage of page sets, keyed by message id.
///
/// Implementations only need to make single calls atomic; read-modify-write
/// sequences are serialized by [`super::FeedService`].
pub trait MessageStore: Send + Sync {
    fn load(&self, message_id: &str) -> Result<Option<PageSet>, StoreError>;
    fn save(&self, message_id: &str, pages: &PageSet) -> Result<(), StoreError>;
    fn message_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: Mutex<BTreeMap<String, PageSet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for MemoryStore {
    fn load(&self, message_id: &str) -> Result<Option<PageSet>, StoreError> {
        let sets = self.sets.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sets.get(message_id).cloned())
    }

    fn save(&self, message_id: &str, pages: &PageSet) -> Result<(), StoreError> {
        let mut sets = self.sets.lock().unwrap_or_else(|e| e.into_inner());
        sets.insert(message_id.to_string(), pages.clone());
        Ok(())
    }

    fn message_ids(&self) -> Result<Vec<String>, StoreError> {
        let sets = self.sets.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sets.keys().cloned().collect())
    }
}

/// One JSON document mapping message id to its persisted page set.
///
/// A missing file is an empty store. Entries are kept as raw JSON so that an
/// unreadable entry only affects its own message.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        // Readers only ever see a complete document: write a sibling, then rename
        let temp_path = self.temp_path();
        fs::write(&temp_path, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl MessageStore for JsonFileStore {
    fn load(&self, message_id: &str) -> Result<Option<PageSet>, StoreError> {
        let _guard = self.file_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_all()?;
        match entries.remove(message_id) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, message_id: &str, pages: &PageSet) -> Result<(), StoreError> {
        let _guard = self.file_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_all()?;
        entries.insert(message_id.to_string(), serde_json::to_value(pages)?);
        self.write_all(&entries)?;
        log::debug!("Saved message {message_id} to {}", self.path.display());
        Ok(())
    }

    fn message_ids(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.file_lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Post;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn one_page_set(username: &str) -> PageSet {
        let mut set = PageSet::new();
        set.append(
            vec![Post {
                username: username.into(),
                ..Default::default()
            }],
            None,
        );
        set
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.load("1").unwrap(), None);
        let set = one_page_set("@a");
        store.save("1", &set).unwrap();
        assert_eq!(store.load("1").unwrap(), Some(set));
        assert_eq!(store.message_ids().unwrap(), vec!["1"]);
    }

    #[test]
    fn test_json_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/store.json"));
        assert_eq!(store.load("1").unwrap(), None);
        assert!(store.message_ids().unwrap().is_empty());
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/store.json");
        let store = JsonFileStore::new(&path);
        let set = one_page_set("@a");
        store.save("7", &set).unwrap();
        store.save("8", &one_page_set("@b")).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load("7").unwrap(), Some(set));
        assert_eq!(reopened.message_ids().unwrap(), vec!["7", "8"]);
    }

    #[test]
    fn test_json_file_store_replaces_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(dir.path().join("store.json.tmp"), "stale").unwrap();
        let store = JsonFileStore::new(&path);
        store.save("1", &one_page_set("@a")).unwrap();
        store.save("1", &one_page_set("@b")).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["store.json"]);
        assert_eq!(
            store.load("1").unwrap().unwrap().current_page().unwrap()[0].username,
            "@b"
        );
    }

    #[test]
    fn test_json_file_store_reads_legacy_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"3": {"pages": [{"username": "@old"}], "collapsed": true}}"#,
        )
        .unwrap();

        let set = JsonFileStore::new(&path).load("3").unwrap().unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.is_collapsed());
        assert_eq!(set.current_page().unwrap()[0].username, "@old");
    }

    #[test]
    fn test_json_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load("1"),
            Err(StoreError::Json(_))
        ));
    }
}
