//! Entity bootstrap
//!
//! Registers the startup set of entities. Runs before the server accepts
//! requests and never touches existing aggregates.

use crate::domain::entities::EntityId;
use crate::domain::ports::EntityRegistry;
use crate::error::DomainError;

/// Register entities `"1"` through `"count"`. Returns how many were new.
pub async fn seed_entities<R: EntityRegistry + ?Sized>(
    registry: &R,
    count: u32,
) -> Result<u32, DomainError> {
    let mut created = 0;
    for n in 1..=count {
        if registry.register_entity(&EntityId(n.to_string())).await? {
            created += 1;
        }
    }

    tracing::info!(requested = count, created = created, "Entities seeded");
    Ok(created)
}
