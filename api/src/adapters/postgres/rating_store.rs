//! PostgreSQL adapter for RatingStore
//!
//! Every write runs in a SERIALIZABLE transaction that first takes a row lock
//! on the entity's aggregate row, so writers of one entity queue on that row
//! while writers of other entities proceed untouched. The wait for that lock
//! is bounded by `lock_timeout`; running out surfaces as `Conflict`.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::map_db_err;
use crate::domain::entities::{
    AggregateDelta, EntityAggregate, EntityId, RaterId, RatingRecord, UpsertOutcome,
    DEFAULT_ENTITY_INFO,
};
use crate::domain::ports::{
    AggregateRepository, EntityRegistry, RatingRepository, RatingStore, StoreTransaction,
};
use crate::entity::{entity_aggregates, ratings};
use crate::error::DomainError;

/// PostgreSQL implementation of RatingStore
pub struct PostgresRatingStore {
    db: DatabaseConnection,
    lock_timeout: Duration,
}

impl PostgresRatingStore {
    pub fn new(db: DatabaseConnection, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }
}

#[async_trait]
impl RatingRepository for PostgresRatingStore {
    async fn find_rating(
        &self,
        entity_id: &EntityId,
        rater_id: &RaterId,
    ) -> Result<Option<RatingRecord>, DomainError> {
        let result = ratings::Entity::find_by_id((entity_id.0.clone(), rater_id.0.clone()))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_ratings(&self, entity_id: &EntityId) -> Result<Vec<RatingRecord>, DomainError> {
        let results = ratings::Entity::find()
            .filter(ratings::Column::EntityId.eq(entity_id.as_str()))
            .order_by_asc(ratings::Column::RaterId)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

#[async_trait]
impl AggregateRepository for PostgresRatingStore {
    async fn find_aggregate(
        &self,
        entity_id: &EntityId,
    ) -> Result<Option<EntityAggregate>, DomainError> {
        let result = entity_aggregates::Entity::find_by_id(entity_id.0.clone())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_aggregates(&self) -> Result<Vec<EntityAggregate>, DomainError> {
        let results = entity_aggregates::Entity::find()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let mut aggregates: Vec<EntityAggregate> = results.into_iter().map(|m| m.into()).collect();
        aggregates.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        Ok(aggregates)
    }
}

#[async_trait]
impl EntityRegistry for PostgresRatingStore {
    async fn register_entity(&self, entity_id: &EntityId) -> Result<bool, DomainError> {
        let model = entity_aggregates::ActiveModel {
            entity_id: Set(entity_id.0.clone()),
            info: Set(DEFAULT_ENTITY_INFO.to_string()),
            rating_sum: Set(0),
            rating_count: Set(0),
        };

        let inserted = entity_aggregates::Entity::insert(model)
            .on_conflict(
                OnConflict::column(entity_aggregates::Column::EntityId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(inserted > 0)
    }

    async fn entity_exists(&self, entity_id: &EntityId) -> Result<bool, DomainError> {
        Ok(self.find_aggregate(entity_id).await?.is_some())
    }
}

#[async_trait]
impl RatingStore for PostgresRatingStore {
    type Tx = PostgresTransaction;

    async fn begin(&self, entity_id: &EntityId) -> Result<Self::Tx, DomainError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .map_err(map_db_err)?;

        // Postgres reads 0 as "wait forever"
        let lock_timeout_ms = self.lock_timeout.as_millis().max(1);
        txn.execute_unprepared(&format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout_ms))
            .await
            .map_err(map_db_err)?;

        // Row lock scopes contention to this entity
        let row = entity_aggregates::Entity::find_by_id(entity_id.0.clone())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?;

        match row {
            Some(row) => Ok(PostgresTransaction {
                txn,
                entity_id: entity_id.clone(),
                aggregate: row.into(),
            }),
            None => {
                txn.rollback().await.map_err(map_db_err)?;
                Err(DomainError::UnknownEntity(entity_id.to_string()))
            }
        }
    }
}

/// Open SERIALIZABLE transaction holding the entity's aggregate row lock
pub struct PostgresTransaction {
    txn: DatabaseTransaction,
    entity_id: EntityId,
    /// Aggregate as of the last statement run in this transaction
    aggregate: EntityAggregate,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    async fn current_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError> {
        let result = ratings::Entity::find_by_id((self.entity_id.0.clone(), rater_id.0.clone()))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(|m| m.value))
    }

    async fn upsert_rating(
        &mut self,
        rater_id: &RaterId,
        value: i32,
    ) -> Result<UpsertOutcome, DomainError> {
        let model = ratings::ActiveModel {
            entity_id: Set(self.entity_id.0.clone()),
            rater_id: Set(rater_id.0.clone()),
            value: Set(value),
        };

        match self.current_rating(rater_id).await? {
            Some(previous) => {
                model.update(&self.txn).await.map_err(map_db_err)?;
                Ok(UpsertOutcome::Replaced { previous })
            }
            None => {
                model.insert(&self.txn).await.map_err(map_db_err)?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn delete_rating(&mut self, rater_id: &RaterId) -> Result<Option<i32>, DomainError> {
        let Some(previous) = self.current_rating(rater_id).await? else {
            return Ok(None);
        };

        ratings::Entity::delete_by_id((self.entity_id.0.clone(), rater_id.0.clone()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(Some(previous))
    }

    async fn apply_delta(
        &mut self,
        delta: AggregateDelta,
    ) -> Result<EntityAggregate, DomainError> {
        let next = self.aggregate.apply(delta)?;
        if delta.is_zero() {
            return Ok(next);
        }

        let result = entity_aggregates::Entity::update_many()
            .col_expr(
                entity_aggregates::Column::RatingSum,
                Expr::col(entity_aggregates::Column::RatingSum).add(delta.sum),
            )
            .col_expr(
                entity_aggregates::Column::RatingCount,
                Expr::col(entity_aggregates::Column::RatingCount).add(delta.count),
            )
            .filter(entity_aggregates::Column::EntityId.eq(self.entity_id.as_str()))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected != 1 {
            return Err(DomainError::InternalInconsistency(format!(
                "aggregate row for entity {} vanished under lock",
                self.entity_id
            )));
        }

        self.aggregate = next.clone();
        Ok(next)
    }

    async fn commit(self) -> Result<(), DomainError> {
        self.txn.commit().await.map_err(map_db_err)
    }

    async fn rollback(self) -> Result<(), DomainError> {
        self.txn.rollback().await.map_err(map_db_err)
    }
}

/// Convert SeaORM model to domain entity
impl From<ratings::Model> for RatingRecord {
    fn from(model: ratings::Model) -> Self {
        RatingRecord {
            entity_id: EntityId(model.entity_id),
            rater_id: RaterId(model.rater_id),
            value: model.value,
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<entity_aggregates::Model> for EntityAggregate {
    fn from(model: entity_aggregates::Model) -> Self {
        EntityAggregate {
            entity_id: EntityId(model.entity_id),
            info: model.info,
            rating_sum: model.rating_sum,
            rating_count: model.rating_count,
        }
    }
}
