//! Shared application state for the HTTP surface

use std::sync::Arc;

use crate::infrastructure::keys::KeyServiceTrait;

#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<dyn KeyServiceTrait>,
}

impl AppState {
    pub fn new(keys: Arc<dyn KeyServiceTrait>) -> Self {
        Self { keys }
    }
}
