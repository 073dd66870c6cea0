//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRatingStore;
pub use postgres::{ensure_schema, PostgresRatingStore};
