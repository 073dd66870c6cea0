//! Mock implementations of port traits
//!
//! `FlakyStore` wraps a real store and injects failures on demand:
//! conflicts when opening a transaction, and a failed aggregate write after
//! the rating record has already been staged. It counts calls so tests can
//! verify retry and rollback behavior.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::domain::entities::{
    AggregateDelta, EntityAggregate, EntityId, RaterId, RatingRecord, UpsertOutcome,
};
use crate::domain::ports::{
    AggregateRepository, RatingRepository, RatingStore, StoreTransaction,
};
use crate::error::DomainError;

// ============================================================================
// Failure-injecting store
// ============================================================================

pub struct FlakyStore<S> {
    inner: S,
    conflicts_remaining: AtomicU32,
    fail_apply_delta: bool,
    begin_calls: AtomicU32,
    rollbacks: Arc<AtomicU32>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            conflicts_remaining: AtomicU32::new(0),
            fail_apply_delta: false,
            begin_calls: AtomicU32::new(0),
            rollbacks: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The next `n` calls to `begin` fail with `Conflict`
    pub fn with_conflicts(self, n: u32) -> Self {
        self.conflicts_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Every `apply_delta` fails with a database error
    pub fn failing_apply_delta(mut self) -> Self {
        self.fail_apply_delta = true;
        self
    }

    pub fn begin_calls(&self) -> u32 {
        self.begin_calls.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> u32 {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: RatingRepository> RatingRepository for FlakyStore<S> {
    async fn find_rating(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
    ) -> Result<Option<RatingRecord>, DomainError> {
        self.inner.find_rating(entity_id, rater_id).await
    }

    async fn list_ratings(&self, entity_id: &EntityId) -> Result<Vec<RatingRecord>, DomainError> {
        self.inner.list_ratings(entity_id).await
    }
}

#[async_trait]
impl<S: AggregateRepository> AggregateRepository for FlakyStore<S> {
    async fn find_aggregate(
        &self,
        entity_id: &EntityId,
    ) -> Result<Option<EntityAggregate>, DomainError> {
        self.inner.find_aggregate(entity_id).await
    }

    async fn list_aggregates(&self) -> Result<Vec<EntityAggregate>, DomainError> {
        self.inner.list_aggregates().await
    }
}

#[async_trait]
impl<S: RatingStore> RatingStore for FlakyStore<S> {
    type Tx = FlakyTransaction<S::Tx>;

    async fn begin(&self, entity_id: &EntityId) -> Result<Self::Tx, DomainError> {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);

        let inject_conflict = self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if inject_conflict {
            return Err(DomainError::Conflict(format!(
                "injected conflict on entity {}",
                entity_id
            )));
        }

        Ok(FlakyTransaction {
            inner: self.inner.begin(entity_id).await?,
            fail_apply_delta: self.fail_apply_delta,
            rollbacks: self.rollbacks.clone(),
        })
    }
}

pub struct FlakyTransaction<T> {
    inner: T,
    fail_apply_delta: bool,
    rollbacks: Arc<AtomicU32>,
}

#[async_trait]
impl<T: StoreTransaction> StoreTransaction for FlakyTransaction<T> {
    fn entity_id(&self) -> &EntityId {
        self.inner.entity_id()
    }

    async fn current_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError> {
        self.inner.current_rating(rater_id).await
    }

    async fn upsert_rating(
        &mut self,
        rater_id: &RaterId,
        value: i32,
    ) -> Result<UpsertOutcome, DomainError> {
        self.inner.upsert_rating(rater_id, value).await
    }

    async fn delete_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError> {
        self.inner.delete_rating(rater_id).await
    }

    async fn apply_delta(
        &mut self,
        delta: AggregateDelta,
    ) -> Result<EntityAggregate, DomainError> {
        if self.fail_apply_delta {
            return Err(DomainError::Database(
                "injected failure writing aggregate".to_string(),
            ));
        }
        self.inner.apply_delta(delta).await
    }

    async fn commit(self) -> Result<(), DomainError> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), DomainError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.inner.rollback().await
    }
}
