//! JSON-file-backed [`KeyValueStore`].
//!
//! The whole store is one JSON object on disk. Writes go to a sibling temp
//! file and are renamed into place, so a crash never leaves a torn file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use autosave_core::{CoreError, KeyValueStore};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, CoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), CoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CoreError::Storage("file store lock poisoned".into()))?;
        let mut entries = self.load()?;
        f(&mut entries);
        self.persist(&entries)
    }

    fn io_error(&self, e: std::io::Error) -> CoreError {
        CoreError::Storage(format!("{}: {e}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("drafts.json"));
        assert!(store.get("anything").expect("get").is_none());
    }

    #[test]
    fn set_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("drafts.json");

        JsonFileStore::new(&path)
            .set("draft:plan", r#"{"title":"Plan"}"#)
            .expect("set");

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get("draft:plan").expect("get").as_deref(),
            Some(r#"{"title":"Plan"}"#)
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn remove_keeps_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("drafts.json"));
        store.set("a", "1").expect("set");
        store.set("b", "2").expect("set");
        store.remove("a").expect("remove");

        assert!(store.get("a").expect("get").is_none());
        assert_eq!(store.get("b").expect("get").as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drafts.json");
        fs::write(&path, "not json").expect("write");

        let err = JsonFileStore::new(&path).get("a").unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
