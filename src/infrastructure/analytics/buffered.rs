//! Buffered analytics sink

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::analytics::{Analytics, KeyVerificationEvent};

/// In-memory buffering sink.
///
/// `publish` hands the event to a bounded channel and returns immediately;
/// a background task drains the channel, records outcome counters and logs
/// the event. When the buffer is full the event is dropped and logged --
/// verification latency is never traded for analytics delivery.
#[derive(Debug, Clone)]
pub struct BufferedAnalytics {
    tx: mpsc::Sender<KeyVerificationEvent>,
}

impl BufferedAnalytics {
    /// Create the sink and spawn its drain task on the current runtime.
    pub fn spawn(buffer: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<KeyVerificationEvent>(buffer.max(1));

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let outcome = event
                    .denied
                    .map(|reason| reason.as_str())
                    .unwrap_or("VALID");
                counter!("keygate_key_verification_events_total", "outcome" => outcome)
                    .increment(1);
                debug!(
                    key_id = %event.key_id,
                    workspace_id = %event.workspace_id,
                    api_id = %event.api_id,
                    outcome,
                    "key verification event"
                );
            }
        });

        Self { tx }
    }
}

#[async_trait]
impl Analytics for BufferedAnalytics {
    async fn publish_key_verification_event(&self, event: KeyVerificationEvent) {
        if let Err(err) = self.tx.try_send(event) {
            warn!(error = %err, "analytics buffer full, dropping verification event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analytics::DeniedReason;

    fn event(denied: Option<DeniedReason>) -> KeyVerificationEvent {
        KeyVerificationEvent {
            workspace_id: "ws_1".to_string(),
            api_id: "api_1".to_string(),
            key_id: "key_1".to_string(),
            denied,
            ip_address: None,
            user_agent: None,
            time: 0,
        }
    }

    #[tokio::test]
    async fn test_publish_does_not_block_when_buffer_is_full() {
        let sink = BufferedAnalytics::spawn(1);

        // Flood well past the buffer size; every call must return.
        for _ in 0..100 {
            sink.publish_key_verification_event(event(Some(DeniedReason::Ratelimited)))
                .await;
        }
    }
}
