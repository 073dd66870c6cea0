//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities and storage ports.

pub mod aggregation_engine;
pub mod bootstrap;
pub mod query_service;
pub mod retry_policy;

pub use aggregation_engine::AggregationEngine;
pub use bootstrap::seed_entities;
pub use query_service::{EntityAverage, QueryService, RaterRating};
pub use retry_policy::RetryPolicy;
