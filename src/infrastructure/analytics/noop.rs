//! Discarding analytics sink

use async_trait::async_trait;

use crate::domain::analytics::{Analytics, KeyVerificationEvent};

#[derive(Debug, Default)]
pub struct NoopAnalytics;

impl NoopAnalytics {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analytics for NoopAnalytics {
    async fn publish_key_verification_event(&self, _event: KeyVerificationEvent) {}
}
