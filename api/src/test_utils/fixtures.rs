//! Test fixtures
//!
//! Factory functions for ids, stores and services with sensible defaults.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::memory::InMemoryRatingStore;
use crate::app::{AggregationEngine, QueryService, RetryPolicy};
use crate::domain::entities::{EntityId, RaterId, RatingBounds};
use crate::domain::ports::RatingStore;
use crate::AppState;

pub fn entity(id: &str) -> EntityId {
    EntityId::from(id)
}

pub fn rater(id: &str) -> RaterId {
    RaterId::from(id)
}

/// In-memory store with the given entities registered
pub fn test_store(entities: &[&str]) -> Arc<InMemoryRatingStore> {
    let store = entities
        .iter()
        .fold(InMemoryRatingStore::default(), |store, id| {
            store.with_entity(*id)
        });
    Arc::new(store)
}

/// Engine over `store` with 1..=5 bounds and a fast retry policy
pub fn test_engine<S: RatingStore>(store: Arc<S>) -> AggregationEngine<S> {
    AggregationEngine::new(
        store,
        RatingBounds::default(),
        RetryPolicy::new(5, Duration::from_millis(1)),
    )
}

/// Router state over a fresh in-memory store
pub fn test_state(entities: &[&str]) -> (AppState<InMemoryRatingStore>, Arc<InMemoryRatingStore>) {
    let store = test_store(entities);
    let state = AppState {
        engine: Arc::new(test_engine(store.clone())),
        queries: Arc::new(QueryService::new(store.clone())),
    };
    (state, store)
}
