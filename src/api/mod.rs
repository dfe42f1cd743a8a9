//! HTTP surface for the key service

pub mod error;
pub mod health;
pub mod keys;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
