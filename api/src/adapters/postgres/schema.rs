//! Table bootstrap
//!
//! Creates the rating tables from their SeaORM definitions if they are missing.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::entity::{entity_aggregates, ratings};

/// Idempotently create `entity_aggregates` and `ratings`.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_if_missing(db, entity_aggregates::Entity).await?;
    create_if_missing(db, ratings::Entity).await?;
    tracing::info!("Rating tables ready");
    Ok(())
}

async fn create_if_missing<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}
