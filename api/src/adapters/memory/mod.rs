//! In-memory adapters
//!
//! Process-local implementation of the storage ports, used when no database
//! is configured and throughout the test suite.

pub mod store;

pub use store::InMemoryRatingStore;
