//! Core of an embeddable markdown editor.
//!
//! An [`EpicEditor`] keeps a set of named markdown files, mirrors the active
//! one into an editable surface and renders it live into a preview surface.
//! Both surfaces live in their own documents inside a wrapper frame, so
//! lookups never leak between them or into the host.

pub mod app;

pub use app::*;
