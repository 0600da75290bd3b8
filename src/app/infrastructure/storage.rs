use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use crate::app::error::Result;

/// A key-value persistence backend for store snapshots.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process storage. Clones share the same entries, so a widget rebuilt
/// on a clone sees what the previous one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the user's data directory: data_dir/epiceditor/
    pub fn default_location() -> Self {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("epiceditor");
        Self::new(path)
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", escape_key(key)))
    }
}

/// ASCII letters, digits and '-' pass through; every other byte becomes
/// `_XX`. Distinct keys always map to distinct file names.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02X}", byte));
        }
    }
    out
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_clones_share_entries() {
        let mut storage = MemoryStorage::new();
        let other = storage.clone();
        assert_eq!(other.read("epiceditor").unwrap(), None);

        storage.write("epiceditor", "{}").unwrap();
        assert_eq!(other.read("epiceditor").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("store"));
        assert_eq!(storage.read("epiceditor").unwrap(), None);

        storage.write("epiceditor", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.read("epiceditor").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("store").join("epiceditor.json").exists());
    }

    #[test]
    fn test_file_storage_escapes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        storage.write("../escape", "x").unwrap();
        assert!(dir.path().join("_2E_2E_2Fescape.json").exists());
        assert_eq!(storage.read("../escape").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_similar_keys_stay_separate() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        storage.write("a.b", "dot").unwrap();
        storage.write("a_b", "underscore").unwrap();
        storage.write("a_2Eb", "literal").unwrap();
        assert_eq!(storage.read("a.b").unwrap().as_deref(), Some("dot"));
        assert_eq!(storage.read("a_b").unwrap().as_deref(), Some("underscore"));
        assert_eq!(storage.read("a_2Eb").unwrap().as_deref(), Some("literal"));
    }

    #[test]
    fn test_escape_key() {
        assert_eq!(escape_key("epiceditor"), "epiceditor");
        assert_eq!(escape_key("my-notes"), "my-notes");
        assert_eq!(escape_key("a.b"), "a_2Eb");
        assert_eq!(escape_key("a_b"), "a_5Fb");
        assert_eq!(escape_key("é"), "_C3_A9");
    }
}
