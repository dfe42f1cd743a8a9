//! API domain model

mod entity;

pub use entity::{Api, AuthType};
