//! Aggregation engine
//!
//! The only write path for ratings. Every mutation updates the rating record
//! and the entity's running (sum, count) inside one store transaction, so
//! `rating_sum == Σ ratings` and `rating_count == |ratings|` hold after every
//! commit and no write ever scans the rating history.

use std::sync::Arc;

use crate::app::retry_policy::RetryPolicy;
use crate::domain::entities::{AggregateDelta, EntityAggregate, EntityId, RaterId, RatingBounds};
use crate::domain::ports::{RatingStore, StoreTransaction};
use crate::error::DomainError;

/// Service applying rating mutations and their aggregate deltas
pub struct AggregationEngine<S>
where
    S: RatingStore,
{
    store: Arc<S>,
    bounds: RatingBounds,
    retry: RetryPolicy,
}

impl<S> AggregationEngine<S>
where
    S: RatingStore,
{
    pub fn new(store: Arc<S>, bounds: RatingBounds, retry: RetryPolicy) -> Self {
        Self {
            store,
            bounds,
            retry,
        }
    }

    /// Create or replace `rater_id`'s rating of `entity_id`.
    ///
    /// A first rating applies `(+value, +1)`; a replacement applies
    /// `(value - previous, 0)`. Returns the committed aggregate.
    pub async fn submit_rating(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
        value: i32,
    ) -> Result<EntityAggregate, DomainError> {
        self.bounds.check(value)?;

        let aggregate = self
            .run(entity_id, rater_id, Mutation::Submit(value))
            .await?;

        tracing::info!(
            entity_id = %entity_id,
            rater_id = %rater_id,
            value = value,
            sum = aggregate.rating_sum,
            count = aggregate.rating_count,
            "Rating submitted"
        );

        Ok(aggregate)
    }

    /// Delete `rater_id`'s rating of `entity_id`, applying `(-previous, -1)`.
    pub async fn remove_rating(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
    ) -> Result<EntityAggregate, DomainError> {
        let aggregate = self.run(entity_id, rater_id, Mutation::Remove).await?;

        tracing::info!(
            entity_id = %entity_id,
            rater_id = %rater_id,
            sum = aggregate.rating_sum,
            count = aggregate.rating_count,
            "Rating removed"
        );

        Ok(aggregate)
    }

    /// Re-run the mutation while it fails with a retryable error, up to the
    /// policy's bound. Every other error is returned as is.
    async fn run(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
        mutation: Mutation,
    ) -> Result<EntityAggregate, DomainError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;
        loop {
            match self.attempt(entity_id, rater_id, mutation).await {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        entity_id = %entity_id,
                        mutation = ?mutation,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Storage conflict, retrying"
                    );
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(e @ DomainError::InternalInconsistency(_)) => {
                    tracing::error!(
                        entity_id = %entity_id,
                        mutation = ?mutation,
                        alert = true,
                        error = %e,
                        "Rating aggregate invariant violated"
                    );
                    return Err(e);
                }
                result => return result,
            }
        }
    }

    /// One transaction: stage the record change and its delta, then commit
    /// both or roll both back.
    async fn attempt(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
        mutation: Mutation,
    ) -> Result<EntityAggregate, DomainError> {
        let mut tx = self.store.begin(entity_id).await?;

        let staged = match mutation {
            Mutation::Submit(value) => stage_submit(&mut tx, rater_id, value).await,
            Mutation::Remove => stage_remove(&mut tx, rater_id).await,
        };

        match staged {
            Ok(aggregate) => {
                tx.commit().await?;
                Ok(aggregate)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        entity_id = %entity_id,
                        error = %rollback_err,
                        "Rollback failed, transaction discarded on drop"
                    );
                }
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Submit(i32),
    Remove,
}

async fn stage_submit<Tx: StoreTransaction>(
    tx: &mut Tx,
    rater_id: &RaterId,
    value: i32,
) -> Result<EntityAggregate, DomainError> {
    let outcome = tx.upsert_rating(rater_id, value).await?;
    tx.apply_delta(outcome.delta(value)).await
}

async fn stage_remove<Tx: StoreTransaction>(
    tx: &mut Tx,
    rater_id: &RaterId,
) -> Result<EntityAggregate, DomainError> {
    let previous = tx.delete_rating(rater_id).await?.ok_or_else(|| {
        DomainError::NotFound(format!(
            "no rating by {} for entity {}",
            rater_id,
            tx.entity_id()
        ))
    })?;
    tx.apply_delta(AggregateDelta::remove(previous)).await
}
