//! Key domain model

mod entity;

pub use entity::{Key, RatelimitPolicy, RatelimitState, RatelimitVariant};
