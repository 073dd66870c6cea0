//! PostgreSQL adapters
//!
//! Implementation of the storage ports using SeaORM and PostgreSQL.

pub mod rating_store;
pub mod schema;


use sea_orm::DbErr;

use crate::error::DomainError;

pub use rating_store::PostgresRatingStore;
pub use schema::ensure_schema;

/// SQLSTATE fragments that mean "retry the transaction"
const RETRYABLE_MARKERS: [&str; 6] = [
    "could not serialize access",
    "deadlock detected",
    "lock timeout",
    "40001",
    "40P01",
    "55P03",
];

/// Map a SeaORM error onto the domain, separating retryable serialization
/// failures from everything else.
pub(crate) fn map_db_err(err: DbErr) -> DomainError {
    let message = err.to_string();
    if RETRYABLE_MARKERS.iter().any(|m| message.contains(m)) {
        DomainError::Conflict(message)
    } else {
        DomainError::Database(message)
    }
}
