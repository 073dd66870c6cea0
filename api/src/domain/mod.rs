//! Domain layer
//!
//! Contains pure rating bookkeeping with no external dependencies.
//! - `entities`: Rating records, per-entity aggregates and deltas
//! - `ports`: Trait definitions for the storage collaborator

pub mod entities;
pub mod ports;
