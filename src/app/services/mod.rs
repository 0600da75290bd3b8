//! Services layer - pure operations used by the controllers.
//!
//! This module contains:
//! - Markdown rendering and export conversion
//! - File name validation

pub mod markdown;
pub mod text_ops;
