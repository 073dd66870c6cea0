//! Domain entities
//!
//! Pure domain models for ratings and their running aggregates.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod aggregate;
pub mod rating;

pub use aggregate::{AggregateDelta, EntityAggregate, DEFAULT_ENTITY_INFO};
pub use rating::{EntityId, RaterId, RatingBounds, RatingRecord, UpsertOutcome};
