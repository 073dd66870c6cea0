//! Rating domain entity
//!
//! One rater's current rating of one entity. A (entity, rater) pair holds at
//! most one record; resubmission replaces the value in place.

use serde::{Deserialize, Serialize};

use super::aggregate::AggregateDelta;
use crate::error::DomainError;

/// Identifier of a rated entity (e.g. a driver)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shorter ids sort first, so numeric ids list as 1, 2, .., 10 rather than
/// 1, 10, 2.
impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.0.len(), &self.0).cmp(&(other.0.len(), &other.0))
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of whoever submits a rating
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaterId(pub String);

impl RaterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RaterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for RaterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rater's current rating of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingRecord {
    pub entity_id: EntityId,
    pub rater_id: RaterId,
    pub value: i32,
}

/// Inclusive range of accepted rating values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingBounds {
    min: i32,
    max: i32,
}

impl RatingBounds {
    pub fn new(min: i32, max: i32) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::Validation(format!(
                "rating range is empty: min {} > max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Reject a value before any state is touched.
    pub fn check(&self, value: i32) -> Result<(), DomainError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(DomainError::InvalidValue {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

/// What an insert-or-replace of a rating record actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed for the pair
    Inserted,
    /// An existing record was overwritten
    Replaced { previous: i32 },
}

impl UpsertOutcome {
    /// Aggregate delta matching this transition to `value`.
    pub fn delta(&self, value: i32) -> AggregateDelta {
        match self {
            UpsertOutcome::Inserted => AggregateDelta::insert(value),
            UpsertOutcome::Replaced { previous } => AggregateDelta::replace(*previous, value),
        }
    }
}
