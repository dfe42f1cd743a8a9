//! Broadcast event bus

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::events::{EventBus, KeyEvent};

/// In-process pub/sub bus over a tokio broadcast channel.
///
/// Lagging or absent subscribers never fail the publishing mutation.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<KeyEvent>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KeyEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn emit_key_event(&self, event: KeyEvent) {
        if self.tx.send(event).is_err() {
            debug!("no subscribers for key event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = BroadcastEventBus::new(8);
        let mut rx = bus.subscribe();

        let event = KeyEvent::Created {
            key_id: "key_1".to_string(),
            hash: "h1".to_string(),
        };
        bus.emit_key_event(event.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_harmless() {
        let bus = BroadcastEventBus::new(8);
        bus.emit_key_event(KeyEvent::Deleted {
            key_id: "key_1".to_string(),
            hash: "h1".to_string(),
        })
        .await;
    }
}
