use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::app::RetryPolicy;
use crate::domain::entities::RatingBounds;
use crate::error::DomainError;

#[derive(Clone, Debug)]
pub struct Config {
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub port: u16,
    pub rating_min: i32,
    pub rating_max: i32,
    /// Attempts per mutation before a storage conflict is surfaced
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    /// Bound on waiting for an entity's write lock
    pub lock_timeout: Duration,
    pub request_timeout: Duration,
    /// Entities "1".."N" registered at startup
    pub seed_entities: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            port: parse_var("PORT", 8080),
            rating_min: parse_var("RATING_MIN", 1),
            rating_max: parse_var("RATING_MAX", 5),
            max_attempts: parse_var("MAX_ATTEMPTS", 3),
            retry_backoff: Duration::from_millis(parse_var("RETRY_BACKOFF_MS", 10)),
            lock_timeout: Duration::from_millis(parse_var("LOCK_TIMEOUT_MS", 2000)),
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 10)),
            seed_entities: parse_var("SEED_ENTITIES", 30),
        }
    }

    /// Valid rating range; fails if min > max
    pub fn rating_bounds(&self) -> Result<RatingBounds, DomainError> {
        RatingBounds::new(self.rating_min, self.rating_max)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_backoff)
    }
}

/// Read and parse an environment variable, keeping `default` when it is
/// missing or malformed.
fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}
