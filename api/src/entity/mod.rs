//! SeaORM entity definitions
//!
//! Table-level models used by the PostgreSQL adapters.

pub mod entity_aggregates;
pub mod ratings;
