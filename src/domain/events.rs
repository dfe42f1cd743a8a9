//! Event bus collaborator trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Key lifecycle events, published after the corresponding mutation.
///
/// Events carry the affected hash so remote nodes can evict their caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyEvent {
    #[serde(rename = "key.created")]
    Created { key_id: String, hash: String },
    #[serde(rename = "key.deleted")]
    Deleted { key_id: String, hash: String },
}

/// Publishes lifecycle events. Publication failure never fails the
/// mutation that produced the event.
#[async_trait]
pub trait EventBus: Send + Sync + Debug {
    async fn emit_key_event(&self, event: KeyEvent);
}
