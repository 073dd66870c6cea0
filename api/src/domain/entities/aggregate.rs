//! Entity aggregate domain entity
//!
//! Running (sum, count) of the live ratings of one entity. The average is
//! derived on read, so no mutation ever needs the rating history.

use serde::Serialize;

use super::rating::EntityId;
use crate::error::DomainError;

/// Info blob given to entities registered without one
pub const DEFAULT_ENTITY_INFO: &str = "{}";

/// Adjustment applied to an aggregate by a single rating mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateDelta {
    pub sum: i64,
    pub count: i64,
}

impl AggregateDelta {
    /// First rating from a rater.
    pub fn insert(value: i32) -> Self {
        Self {
            sum: i64::from(value),
            count: 1,
        }
    }

    /// Rater changed their rating from `previous` to `value`.
    pub fn replace(previous: i32, value: i32) -> Self {
        Self {
            sum: i64::from(value) - i64::from(previous),
            count: 0,
        }
    }

    /// Rater's rating was deleted.
    pub fn remove(previous: i32) -> Self {
        Self {
            sum: -i64::from(previous),
            count: -1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.sum == 0 && self.count == 0
    }

    pub fn combine(self, other: AggregateDelta) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }
}

/// Running rating sum and count for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityAggregate {
    pub entity_id: EntityId,
    /// Opaque descriptive blob stored alongside the aggregate; never parsed
    pub info: String,
    pub rating_sum: i64,
    pub rating_count: i64,
}

impl EntityAggregate {
    /// Aggregate of a freshly registered entity.
    pub fn empty(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            info: DEFAULT_ENTITY_INFO.to_string(),
            rating_sum: 0,
            rating_count: 0,
        }
    }

    /// `None` while there are no ratings.
    pub fn average(&self) -> Option<f64> {
        if self.rating_count > 0 {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        } else {
            None
        }
    }

    /// Returns the aggregate after `delta`, refusing any result that could not
    /// correspond to a set of live ratings.
    pub fn apply(&self, delta: AggregateDelta) -> Result<Self, DomainError> {
        let next = Self {
            entity_id: self.entity_id.clone(),
            info: self.info.clone(),
            rating_sum: self.rating_sum + delta.sum,
            rating_count: self.rating_count + delta.count,
        };
        next.check_consistent()?;
        Ok(next)
    }

    pub fn check_consistent(&self) -> Result<(), DomainError> {
        if self.rating_count < 0 {
            return Err(DomainError::InternalInconsistency(format!(
                "entity {} rating_count would be {}",
                self.entity_id, self.rating_count
            )));
        }
        if self.rating_count == 0 && self.rating_sum != 0 {
            return Err(DomainError::InternalInconsistency(format!(
                "entity {} has rating_sum {} with no ratings",
                self.entity_id, self.rating_sum
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(sum: i64, count: i64) -> EntityAggregate {
        EntityAggregate {
            entity_id: EntityId::from("1"),
            info: DEFAULT_ENTITY_INFO.to_string(),
            rating_sum: sum,
            rating_count: count,
        }
    }

    #[test]
    fn empty_has_no_average() {
        let agg = EntityAggregate::empty(EntityId::from("1"));
        assert_eq!(agg.average(), None);
        assert_eq!(agg.info, "{}");
    }

    #[test]
    fn apply_keeps_info() {
        let mut agg = EntityAggregate::empty(EntityId::from("1"));
        agg.info = r#"{"car":"blue"}"#.to_string();
        let next = agg.apply(AggregateDelta::insert(3)).unwrap();
        assert_eq!(next.info, r#"{"car":"blue"}"#);
    }

    #[test]
    fn average_is_exact_mean() {
        assert_eq!(aggregate(9, 2).average(), Some(4.5));
        assert_eq!(aggregate(40, 10).average(), Some(4.0));
    }

    #[test]
    fn hand_traced_updates() {
        // 10 existing ratings summing to 36, then one new rater submits 4, 5, 2
        let start = aggregate(36, 10);
        let after_insert = start.apply(AggregateDelta::insert(4)).unwrap();
        assert_eq!((after_insert.rating_sum, after_insert.rating_count), (40, 11));

        let after_first = after_insert.apply(AggregateDelta::replace(4, 5)).unwrap();
        assert_eq!((after_first.rating_sum, after_first.rating_count), (41, 11));

        let after_second = after_first.apply(AggregateDelta::replace(5, 2)).unwrap();
        assert_eq!((after_second.rating_sum, after_second.rating_count), (38, 11));
    }

    #[test]
    fn remove_restores_empty() {
        let agg = EntityAggregate::empty(EntityId::from("1"))
            .apply(AggregateDelta::insert(5))
            .unwrap()
            .apply(AggregateDelta::remove(5))
            .unwrap();
        assert_eq!((agg.rating_sum, agg.rating_count), (0, 0));
    }

    #[test]
    fn negative_count_is_inconsistent() {
        let result = EntityAggregate::empty(EntityId::from("1")).apply(AggregateDelta::remove(3));
        assert!(matches!(result, Err(DomainError::InternalInconsistency(_))));
    }

    #[test]
    fn sum_without_ratings_is_inconsistent() {
        assert!(matches!(
            aggregate(3, 0).check_consistent(),
            Err(DomainError::InternalInconsistency(_))
        ));
    }

    #[test]
    fn combine_and_zero() {
        let delta = AggregateDelta::insert(4).combine(AggregateDelta::replace(4, 1));
        assert_eq!(delta, AggregateDelta { sum: 1, count: 1 });
        assert!(AggregateDelta::replace(3, 3).is_zero());
        assert!(!delta.is_zero());
    }
}
