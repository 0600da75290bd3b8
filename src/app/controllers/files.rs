use std::collections::{BTreeMap, HashMap};

use crate::app::domain::document::FileRecord;
use crate::app::error::{EditorError, Result};
use crate::app::infrastructure::storage::Storage;
use crate::app::services::text_ops::validate_name;

/// What an import did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Created,
    Updated,
    Unchanged,
}

/// A file to import. Unset fields fall back to the store's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileImport {
    pub name: Option<String>,
    pub content: Option<String>,
    pub kind: Option<String>,
    pub meta: Option<serde_json::Value>,
}

impl FileImport {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Import into whichever file is currently active.
    pub fn active() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Named markdown files plus the active-file pointer.
///
/// `active`, when set, always names an entry of `files`.
pub struct FileStore {
    files: HashMap<String, FileRecord>,
    active: Option<String>,
    default_content: String,
    backend: Option<Box<dyn Storage>>,
    storage_key: String,
}

impl FileStore {
    pub fn new(default_content: impl Into<String>) -> Self {
        Self {
            files: HashMap::new(),
            active: None,
            default_content: default_content.into(),
            backend: None,
            storage_key: String::new(),
        }
    }

    /// A store persisted under `key` in `backend`. Any snapshot already
    /// stored there is read back; an unreadable one is logged and ignored.
    pub fn with_storage(
        default_content: impl Into<String>,
        backend: Box<dyn Storage>,
        key: impl Into<String>,
    ) -> Self {
        let mut store = Self::new(default_content);
        store.storage_key = key.into();

        match backend.read(&store.storage_key) {
            Ok(Some(snapshot)) => match Self::parse_snapshot(&snapshot) {
                Ok(files) => {
                    log::debug!("Restored {} file(s) from '{}'", files.len(), store.storage_key);
                    store.files = files;
                }
                Err(e) => log::warn!(
                    "Ignoring unreadable snapshot under '{}': {}",
                    store.storage_key,
                    e
                ),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Failed to read '{}': {}", store.storage_key, e),
        }

        store.backend = Some(backend);
        store
    }

    fn parse_snapshot(snapshot: &str) -> Result<HashMap<String, FileRecord>> {
        let mut files: HashMap<String, FileRecord> = serde_json::from_str(snapshot)?;
        for (name, record) in files.iter_mut() {
            record.name = name.clone();
        }
        Ok(files)
    }

    /// Serialize all files, keyed by name in sorted order.
    pub fn snapshot(&self) -> Result<String> {
        let ordered: BTreeMap<&String, &FileRecord> = self.files.iter().collect();
        Ok(serde_json::to_string(&ordered)?)
    }

    /// Write the snapshot to the backend. A store without one is a no-op.
    pub fn persist(&mut self) -> Result<()> {
        if self.backend.is_none() {
            return Ok(());
        }
        let snapshot = self.snapshot()?;
        if let Some(backend) = self.backend.as_mut() {
            backend.write(&self.storage_key, &snapshot)?;
        }
        Ok(())
    }

    /// Create or overwrite a file. Missing content means the default
    /// content, for new and existing files alike. Does not change the
    /// active file.
    pub fn import(&mut self, name: &str, import: FileImport) -> Result<ImportOutcome> {
        validate_name(name)?;

        match self.files.get_mut(name) {
            Some(record) => {
                let content = import
                    .content
                    .unwrap_or_else(|| self.default_content.clone());
                let changed = record.write(&content);
                if import.kind.is_some() {
                    record.kind = import.kind;
                }
                if import.meta.is_some() {
                    record.meta = import.meta;
                }
                Ok(if changed {
                    ImportOutcome::Updated
                } else {
                    ImportOutcome::Unchanged
                })
            }
            None => {
                let content = import
                    .content
                    .unwrap_or_else(|| self.default_content.clone());
                let mut record = FileRecord::new(name, content);
                record.kind = import.kind;
                record.meta = import.meta;
                self.files.insert(name.to_string(), record);
                Ok(ImportOutcome::Created)
            }
        }
    }

    /// Create `name` with the default content unless it already exists.
    /// Returns true if it was created.
    pub fn ensure(&mut self, name: &str) -> Result<bool> {
        if self.contains(name) {
            return Ok(false);
        }
        self.import(name, FileImport::default())?;
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.files.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_record(&self) -> Option<&FileRecord> {
        let name = self.active.as_deref()?;
        self.files.get(name)
    }

    /// Make `name` the active file.
    pub fn open(&mut self, name: &str) -> Result<&FileRecord> {
        match self.files.get(name) {
            Some(record) => {
                self.active = Some(name.to_string());
                Ok(record)
            }
            None => Err(EditorError::NotFound(name.to_string())),
        }
    }

    /// Overwrite the active file's content. Returns the active name and
    /// whether the content changed, or None with no active file.
    pub fn write_active(&mut self, content: &str) -> Option<(String, bool)> {
        let name = self.active.clone()?;
        let record = self.files.get_mut(&name)?;
        let changed = record.write(content);
        Some((name, changed))
    }

    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        if !self.contains(old_name) {
            return Err(EditorError::NotFound(old_name.to_string()));
        }
        if old_name == new_name {
            return Ok(());
        }
        if self.contains(new_name) {
            return Err(EditorError::Conflict(new_name.to_string()));
        }

        if let Some(mut record) = self.files.remove(old_name) {
            record.name = new_name.to_string();
            self.files.insert(new_name.to_string(), record);
        }
        if self.active.as_deref() == Some(old_name) {
            self.active = Some(new_name.to_string());
        }
        Ok(())
    }

    /// Delete a file. Returns true if it was the active file, in which case
    /// no file is active afterwards.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if self.files.remove(name).is_none() {
            return Err(EditorError::NotFound(name.to_string()));
        }
        let was_active = self.active.as_deref() == Some(name);
        if was_active {
            self.active = None;
        }
        Ok(was_active)
    }
}
