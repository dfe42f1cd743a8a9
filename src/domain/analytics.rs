//! Analytics collaborator trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Why a verification was denied, as recorded in analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeniedReason {
    #[serde(rename = "RATELIMITED")]
    Ratelimited,
    #[serde(rename = "USAGE_EXCEEDED")]
    UsageExceeded,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl DeniedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ratelimited => "RATELIMITED",
            Self::UsageExceeded => "USAGE_EXCEEDED",
            Self::Forbidden => "FORBIDDEN",
            Self::Expired => "EXPIRED",
        }
    }
}

/// One record per `verify_key` call that resolved a key and its API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyVerificationEvent {
    pub workspace_id: String,
    pub api_id: String,
    pub key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied: Option<DeniedReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Milliseconds since epoch.
    pub time: i64,
}

/// Fire-and-forget sink for verification events.
///
/// Implementations buffer in memory and flush out of band; a publish call
/// must not block the verification response. Failures are logged by the
/// sink, never surfaced to the caller.
#[async_trait]
pub trait Analytics: Send + Sync + Debug {
    async fn publish_key_verification_event(&self, event: KeyVerificationEvent);
}
