//! keygate
//!
//! The key verification core of an API-key authentication service:
//! - `verify_key` resolves a presented secret through read-through key and
//!   API caches, applies soft-delete, expiration and IP-whitelist checks,
//!   accounts rate limits before any quota decrement, and publishes a
//!   verification event without blocking the caller
//! - `create_key` persists hashed key records
//! - `soft_delete_key` tombstones them
//!
//! Collaborators (database, caches, rate limiters, analytics, event bus)
//! are consumed through the traits in [`domain`]; the implementations in
//! [`infrastructure`] cover single-node deployments and tests.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
