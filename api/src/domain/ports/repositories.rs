//! Storage port traits
//!
//! These traits define the interface for rating persistence.
//! Implementations are provided by adapters (in-memory, PostgreSQL).
//!
//! Reads go through `RatingRepository` and `AggregateRepository` and never
//! mutate. Every write goes through a `StoreTransaction` opened by
//! `RatingStore::begin`, which covers both the rating record and the
//! aggregate of one entity so the two can never drift apart.

use async_trait::async_trait;

use crate::domain::entities::{
    AggregateDelta, EntityAggregate, EntityId, RaterId, RatingRecord, UpsertOutcome,
};
use crate::error::DomainError;

/// Read access to individual rating records
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Point lookup by (entity, rater)
    async fn find_rating(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
    ) -> Result<Option<RatingRecord>, DomainError>;

    /// All live ratings of one entity, without touching other entities
    async fn list_ratings(&self, entity_id: &EntityId) -> Result<Vec<RatingRecord>, DomainError>;
}

/// Read access to per-entity aggregates
///
/// Each returned aggregate is read as one unit; sum and count always come
/// from the same committed mutation.
#[async_trait]
pub trait AggregateRepository: Send + Sync {
    /// Aggregate of one entity, `None` if the entity is not registered
    async fn find_aggregate(
        &self,
        entity_id: &EntityId,
    ) -> Result<Option<EntityAggregate>, DomainError>;

    /// Aggregates of every registered entity, ordered by entity id
    async fn list_aggregates(&self) -> Result<Vec<EntityAggregate>, DomainError>;
}

/// Entity bootstrap, kept apart from the rating write path
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    /// Register an entity with an empty aggregate. Returns false if it
    /// already existed, in which case its aggregate is left untouched.
    async fn register_entity(&self, entity_id: &EntityId) -> Result<bool, DomainError>;

    async fn entity_exists(&self, entity_id: &EntityId) -> Result<bool, DomainError>;
}

/// One atomic unit of work over a single entity's ratings and aggregate.
///
/// Nothing is visible to readers until `commit`. Dropping the transaction
/// without committing discards every staged change.
#[async_trait]
pub trait StoreTransaction: Send {
    fn entity_id(&self) -> &EntityId;

    /// Current value of a rater's rating as seen inside this transaction
    async fn current_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError>;

    /// Insert or replace a rating, reporting the prior value if any
    async fn upsert_rating(
        &mut self,
        rater_id: &RaterId,
        value: i32,
    ) -> Result<UpsertOutcome, DomainError>;

    /// Delete a rating, returning the deleted value if it existed
    async fn delete_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError>;

    /// Apply a delta to the entity's aggregate and return the result.
    /// A delta that would drive the count below zero fails with
    /// `InternalInconsistency` and changes nothing.
    async fn apply_delta(&mut self, delta: AggregateDelta)
        -> Result<EntityAggregate, DomainError>;

    async fn commit(self) -> Result<(), DomainError>;

    async fn rollback(self) -> Result<(), DomainError>;
}

/// Durable storage for ratings and aggregates
#[async_trait]
pub trait RatingStore: RatingRepository + AggregateRepository {
    type Tx: StoreTransaction;

    /// Open a transaction scoped to `entity_id`.
    ///
    /// Fails with `UnknownEntity` if the entity is not registered and with
    /// `Conflict` if the entity's write scope cannot be acquired in time.
    /// Transactions on different entities never wait on each other.
    async fn begin(&self, entity_id: &EntityId) -> Result<Self::Tx, DomainError>;
}
