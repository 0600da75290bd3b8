//! Infrastructure layer - external integrations and utilities.
//!
//! This module contains code that stands in for the host environment:
//! - The in-memory document tree the surfaces are built from
//! - Persistence backends

pub mod dom;
pub mod storage;
