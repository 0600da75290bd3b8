use std::fmt;
use std::str::FromStr;

use crate::app::error::EditorError;

/// Discriminant of an [`Event`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Load,
    Unload,
    Create,
    Open,
    Update,
    Save,
    Autosave,
    Rename,
    Remove,
    Preview,
    Edit,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::Load,
        EventKind::Unload,
        EventKind::Create,
        EventKind::Open,
        EventKind::Update,
        EventKind::Save,
        EventKind::Autosave,
        EventKind::Rename,
        EventKind::Remove,
        EventKind::Preview,
        EventKind::Edit,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Load => "load",
            EventKind::Unload => "unload",
            EventKind::Create => "create",
            EventKind::Open => "open",
            EventKind::Update => "update",
            EventKind::Save => "save",
            EventKind::Autosave => "autosave",
            EventKind::Rename => "rename",
            EventKind::Remove => "remove",
            EventKind::Preview => "preview",
            EventKind::Edit => "edit",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EditorError::Config(format!("unknown event: {s}")))
    }
}

/// Everything the widget announces to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Load,
    Unload,
    Create { name: String },
    Open { name: String },
    Update { name: String },
    Save { name: String },
    Autosave { name: String },
    Rename { from: String, to: String },
    Remove { name: String },
    Preview,
    Edit,
    Error { message: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Load => EventKind::Load,
            Event::Unload => EventKind::Unload,
            Event::Create { .. } => EventKind::Create,
            Event::Open { .. } => EventKind::Open,
            Event::Update { .. } => EventKind::Update,
            Event::Save { .. } => EventKind::Save,
            Event::Autosave { .. } => EventKind::Autosave,
            Event::Rename { .. } => EventKind::Rename,
            Event::Remove { .. } => EventKind::Remove,
            Event::Preview => EventKind::Preview,
            Event::Edit => EventKind::Edit,
            Event::Error { .. } => EventKind::Error,
        }
    }

    pub fn error(err: &EditorError) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }

    /// The file this event concerns, if any. Renames report the new name.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Event::Create { name }
            | Event::Open { name }
            | Event::Update { name }
            | Event::Save { name }
            | Event::Autosave { name }
            | Event::Remove { name } => Some(name),
            Event::Rename { to, .. } => Some(to),
            _ => None,
        }
    }
}
