use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One named markdown document known to the file store.
///
/// The name is the store's map key. It is not part of the persisted record
/// and is filled back in when a snapshot is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(skip)]
    pub name: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Reserved for document typing. Stored, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Reserved for caller metadata. Stored, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            content: content.into(),
            created: now,
            modified: now,
            kind: None,
            meta: None,
        }
    }

    /// Replace the content. Returns true if it actually changed; the
    /// modified timestamp is bumped on every write either way.
    pub fn write(&mut self, content: &str) -> bool {
        self.modified = Utc::now();
        if self.content == content {
            return false;
        }
        self.content = content.to_string();
        true
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
