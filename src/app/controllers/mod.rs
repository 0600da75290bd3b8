//! Controllers layer - orchestration and coordination.
//!
//! This module contains controllers that coordinate between
//! domain models, services, and the surfaces:
//! - File store
//! - Editor/preview synchronization
//! - Load/unload lifecycle
//! - Event dispatch

pub mod events;
pub mod files;
pub mod lifecycle;
pub mod preview;
