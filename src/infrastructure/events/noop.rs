//! Discarding event bus

use async_trait::async_trait;

use crate::domain::events::{EventBus, KeyEvent};

#[derive(Debug, Default)]
pub struct NoopEventBus;

impl NoopEventBus {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventBus for NoopEventBus {
    async fn emit_key_event(&self, _event: KeyEvent) {}
}
