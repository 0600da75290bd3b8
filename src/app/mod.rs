//! Application layer - organized by Clean Architecture principles.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (FileRecord, Settings, Event)
//! - `controllers/` - Orchestration (FileStore, Lifecycle, ContentBridge, EventBus)
//! - `services/` - Pure operations (markdown rendering, name validation)
//! - `infrastructure/` - Host stand-ins (document tree, storage backends)
//! - `error.rs` - Crate-wide error type
//! - `state.rs` - The editor widget facade

pub mod controllers;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;
pub mod state;

// Re-exports for convenient external access
pub use controllers::events::{ListenerId, ListenerResult};
pub use controllers::files::FileImport;
pub use controllers::lifecycle::{ElementKey, Handle, LifecycleState};
pub use domain::{Event, EventKind, FileRecord, FileSettings, Settings, ThemeSettings};
pub use error::{EditorError, Result};
pub use infrastructure::dom::{Container, Document, Element, Tag};
pub use infrastructure::storage::{FileStorage, MemoryStorage, Storage};
pub use services::markdown::{ExportFormat, MarkdownRenderer, Renderer};
pub use state::{EpicEditor, EpicEditorBuilder};
