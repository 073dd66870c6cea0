//! In-memory adapter for RatingStore
//!
//! Each entity owns a shard: an async write lock that serializes writers of
//! that entity only, and the committed state behind a synchronous `RwLock`.
//! A transaction holds the write lock, stages its changes privately and
//! publishes them under a single state write on commit, so readers see the
//! rating list and the (sum, count) pair from the same point in time.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{
    AggregateDelta, EntityAggregate, EntityId, RaterId, RatingRecord, UpsertOutcome,
};
use crate::domain::ports::{
    AggregateRepository, EntityRegistry, RatingRepository, RatingStore, StoreTransaction,
};
use crate::error::DomainError;

/// Default bound on waiting for an entity's write lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
struct EntityState {
    aggregate: EntityAggregate,
    ratings: BTreeMap<RaterId, i32>,
}

struct EntityShard {
    writer: Arc<Mutex<()>>,
    state: RwLock<EntityState>,
}

impl EntityShard {
    fn new(entity_id: EntityId) -> Self {
        Self {
            writer: Arc::new(Mutex::new(())),
            state: RwLock::new(EntityState {
                aggregate: EntityAggregate::empty(entity_id),
                ratings: BTreeMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EntityState>, DomainError> {
        self.state
            .read()
            .map_err(|_| DomainError::Database("entity state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EntityState>, DomainError> {
        self.state
            .write()
            .map_err(|_| DomainError::Database("entity state lock poisoned".to_string()))
    }
}

/// In-process implementation of RatingStore
pub struct InMemoryRatingStore {
    shards: RwLock<HashMap<EntityId, Arc<EntityShard>>>,
    lock_timeout: Duration,
}

impl Default for InMemoryRatingStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl InMemoryRatingStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Pre-register an entity
    #[cfg(test)]
    pub fn with_entity(self, entity_id: impl Into<EntityId>) -> Self {
        let entity_id = entity_id.into();
        self.shards
            .write()
            .unwrap()
            .entry(entity_id.clone())
            .or_insert_with(|| Arc::new(EntityShard::new(entity_id)));
        self
    }

    fn shard(&self, entity_id: &EntityId) -> Result<Option<Arc<EntityShard>>, DomainError> {
        let shards = self
            .shards
            .read()
            .map_err(|_| DomainError::Database("shard map lock poisoned".to_string()))?;
        Ok(shards.get(entity_id).cloned())
    }

    /// Overwrite an entity's aggregate without touching its ratings.
    #[cfg(test)]
    pub fn overwrite_aggregate(&self, entity_id: &EntityId, rating_sum: i64, rating_count: i64) {
        let shard = self.shard(entity_id).unwrap().unwrap();
        let mut state = shard.write().unwrap();
        state.aggregate.rating_sum = rating_sum;
        state.aggregate.rating_count = rating_count;
    }
}

#[async_trait]
impl RatingRepository for InMemoryRatingStore {
    async fn find_rating(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
    ) -> Result<Option<RatingRecord>, DomainError> {
        let Some(shard) = self.shard(entity_id)? else {
            return Ok(None);
        };
        let state = shard.read()?;
        Ok(state.ratings.get(rater_id).map(|value| RatingRecord {
            entity_id: entity_id.clone(),
            rater_id: rater_id.clone(),
            value: *value,
        }))
    }

    async fn list_ratings(&self, entity_id: &EntityId) -> Result<Vec<RatingRecord>, DomainError> {
        let Some(shard) = self.shard(entity_id)? else {
            return Ok(Vec::new());
        };
        let state = shard.read()?;
        Ok(state
            .ratings
            .iter()
            .map(|(rater_id, value)| RatingRecord {
                entity_id: entity_id.clone(),
                rater_id: rater_id.clone(),
                value: *value,
            })
            .collect())
    }
}

#[async_trait]
impl AggregateRepository for InMemoryRatingStore {
    async fn find_aggregate(
        &self,
        entity_id: &EntityId,
    ) -> Result<Option<EntityAggregate>, DomainError> {
        match self.shard(entity_id)? {
            Some(shard) => Ok(Some(shard.read()?.aggregate.clone())),
            None => Ok(None),
        }
    }

    async fn list_aggregates(&self) -> Result<Vec<EntityAggregate>, DomainError> {
        let shards: Vec<Arc<EntityShard>> = {
            let shards = self
                .shards
                .read()
                .map_err(|_| DomainError::Database("shard map lock poisoned".to_string()))?;
            shards.values().cloned().collect()
        };

        let mut aggregates = shards
            .iter()
            .map(|shard| shard.read().map(|state| state.aggregate.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        aggregates.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        Ok(aggregates)
    }
}

#[async_trait]
impl EntityRegistry for InMemoryRatingStore {
    async fn register_entity(&self, entity_id: &EntityId) -> Result<bool, DomainError> {
        let mut shards = self
            .shards
            .write()
            .map_err(|_| DomainError::Database("shard map lock poisoned".to_string()))?;
        if shards.contains_key(entity_id) {
            return Ok(false);
        }
        shards.insert(
            entity_id.clone(),
            Arc::new(EntityShard::new(entity_id.clone())),
        );
        Ok(true)
    }

    async fn entity_exists(&self, entity_id: &EntityId) -> Result<bool, DomainError> {
        Ok(self.shard(entity_id)?.is_some())
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self, entity_id: &EntityId) -> Result<Self::Tx, DomainError> {
        let shard = self
            .shard(entity_id)?
            .ok_or_else(|| DomainError::UnknownEntity(entity_id.to_string()))?;

        let guard = tokio::time::timeout(self.lock_timeout, shard.writer.clone().lock_owned())
            .await
            .map_err(|_| {
                DomainError::Conflict(format!(
                    "timed out after {:?} waiting for entity {}",
                    self.lock_timeout, entity_id
                ))
            })?;

        Ok(InMemoryTransaction {
            entity_id: entity_id.clone(),
            shard,
            _guard: guard,
            staged_ratings: BTreeMap::new(),
            staged_delta: AggregateDelta::default(),
        })
    }
}

/// Transaction over one entity's shard. Holds the shard's write lock until
/// it is committed, rolled back or dropped.
pub struct InMemoryTransaction {
    entity_id: EntityId,
    shard: Arc<EntityShard>,
    _guard: OwnedMutexGuard<()>,
    /// `None` marks a staged deletion
    staged_ratings: BTreeMap<RaterId, Option<i32>>,
    staged_delta: AggregateDelta,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    async fn current_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError> {
        if let Some(staged) = self.staged_ratings.get(rater_id) {
            return Ok(*staged);
        }
        Ok(self.shard.read()?.ratings.get(rater_id).copied())
    }

    async fn upsert_rating(
        &mut self,
        rater_id: &RaterId,
        value: i32,
    ) -> Result<UpsertOutcome, DomainError> {
        let outcome = match self.current_rating(rater_id).await? {
            Some(previous) => UpsertOutcome::Replaced { previous },
            None => UpsertOutcome::Inserted,
        };
        self.staged_ratings.insert(rater_id.clone(), Some(value));
        Ok(outcome)
    }

    async fn delete_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError> {
        let previous = self.current_rating(rater_id).await?;
        if previous.is_some() {
            self.staged_ratings.insert(rater_id.clone(), None);
        }
        Ok(previous)
    }

    async fn apply_delta(
        &mut self,
        delta: AggregateDelta,
    ) -> Result<EntityAggregate, DomainError> {
        let staged = self.staged_delta.combine(delta);
        let projected = self.shard.read()?.aggregate.apply(staged)?;
        self.staged_delta = staged;
        Ok(projected)
    }

    async fn commit(self) -> Result<(), DomainError> {
        let mut state = self.shard.write()?;
        let aggregate = state.aggregate.apply(self.staged_delta)?;
        for (rater_id, staged) in &self.staged_ratings {
            match staged {
                Some(value) => {
                    state.ratings.insert(rater_id.clone(), *value);
                }
                None => {
                    state.ratings.remove(rater_id);
                }
            }
        }
        state.aggregate = aggregate;
        Ok(())
    }

    async fn rollback(self) -> Result<(), DomainError> {
        Ok(())
    }
}
