//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod entities;
pub mod ratings;

pub use entities::list_entities;
pub use ratings::{list_ratings, remove_rating, submit_rating};
