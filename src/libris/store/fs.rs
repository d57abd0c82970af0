use super::KeyValueStore;
use crate::error::{LibrisError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed key-value store: each slot is `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(LibrisError::Io)?;
        }
        Ok(())
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LibrisError::Store(format!("Invalid slot key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(LibrisError::Io)?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        self.ensure_dir()?;

        // Write to a sibling then rename so a crash never leaves half a slot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(LibrisError::Io)?;
        fs::rename(&tmp, &path).map_err(LibrisError::Io)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        if path.exists() {
            fs::remove_file(path).map_err(LibrisError::Io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_root_on_first_write() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("nested").join("data");
        let store = FileStore::new(&root);

        assert_eq!(store.get("library_books").unwrap(), None);
        store.set("library_books", "[]").unwrap();

        assert!(root.join("library_books.json").exists());
        assert_eq!(store.get("library_books").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        store.set("auth_token", "\"abc\"").unwrap();

        store.remove("auth_token").unwrap();
        store.remove("auth_token").unwrap();
        assert_eq!(store.get("auth_token").unwrap(), None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        assert!(matches!(
            store.set("../escape", "x"),
            Err(LibrisError::Store(_))
        ));
        assert!(matches!(store.get(""), Err(LibrisError::Store(_))));
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        store.set("library_stores", "[1]").unwrap();
        store.set("library_stores", "[2]").unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["library_stores.json".to_string()]);
    }
}
