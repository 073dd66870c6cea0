//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why manual mocks instead of mockall?
//! - The store traits carry an associated transaction type, which mockall
//!   handles poorly together with `async_trait`
//! - Manual mocks are more explicit and easier to debug
//! - A decorator over the real in-memory store keeps the semantics honest
//!   and only injects the failures a test asks for

pub mod fixtures;
pub mod logs;
pub mod mocks;

pub use fixtures::*;
pub use logs::CapturedLogs;
pub use mocks::*;
