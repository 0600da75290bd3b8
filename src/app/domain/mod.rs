//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - File records
//! - Widget settings
//! - Event types for the event bus

pub mod document;
pub mod events;
pub mod settings;

pub use document::FileRecord;
pub use events::{Event, EventKind};
pub use settings::{FileSettings, Settings, ThemeSettings};
