//! Query service
//!
//! Read-only views derived from the stores. Averages come straight from the
//! per-entity aggregates; no read ever joins against raw ratings.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::{EntityId, RaterId};
use crate::domain::ports::{AggregateRepository, RatingRepository};
use crate::error::DomainError;

/// An entity with its derived average
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityAverage {
    pub entity_id: EntityId,
    pub info: String,
    /// `None` while the entity has no ratings
    pub average_rating: Option<f64>,
}

/// One rater's rating of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaterRating {
    pub rater_id: RaterId,
    pub value: i32,
}

/// Service for rating reads
pub struct QueryService<R>
where
    R: RatingRepository + AggregateRepository,
{
    store: Arc<R>,
}

impl<R> QueryService<R>
where
    R: RatingRepository + AggregateRepository,
{
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Every registered entity with `average = sum / count`, ordered by id.
    pub async fn list_entities(&self) -> Result<Vec<EntityAverage>, DomainError> {
        let aggregates = self.store.list_aggregates().await?;

        aggregates
            .into_iter()
            .map(|aggregate| {
                if let Err(e) = aggregate.check_consistent() {
                    tracing::error!(
                        entity_id = %aggregate.entity_id,
                        alert = true,
                        error = %e,
                        "Rating aggregate invariant violated"
                    );
                    return Err(e);
                }
                Ok(EntityAverage {
                    average_rating: aggregate.average(),
                    entity_id: aggregate.entity_id,
                    info: aggregate.info,
                })
            })
            .collect()
    }

    /// All live ratings of one entity.
    pub async fn list_ratings(&self, entity_id: &EntityId) -> Result<Vec<RaterRating>, DomainError> {
        if self.store.find_aggregate(entity_id).await?.is_none() {
            return Err(DomainError::UnknownEntity(entity_id.to_string()));
        }

        let records = self.store.list_ratings(entity_id).await?;
        Ok(records
            .into_iter()
            .map(|record| RaterRating {
                rater_id: record.rater_id,
                value: record.value,
            })
            .collect())
    }
}
