//! Key entity and the rate-limit policy attached to it

use serde::{Deserialize, Serialize};

/// Which rate limiter enforces the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatelimitVariant {
    /// Node-local token bucket. Lowest latency, no coordination.
    Fast,
    /// Cluster-coordinated limiter enforcing a global bound.
    Consistent,
}

/// Rate-limit policy attached to a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatelimitPolicy {
    pub variant: RatelimitVariant,
    /// Bucket capacity.
    pub limit: i32,
    /// Tokens added per refill interval.
    pub refill_rate: i32,
    /// Refill interval in milliseconds.
    pub refill_interval: i64,
}

/// Snapshot of a rate-limit bucket, echoed to the caller on every
/// rate-limited verification, including denials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatelimitState {
    pub limit: i32,
    pub remaining: i32,
    /// Milliseconds since epoch at which the bucket refills.
    pub reset_at: i64,
}

/// The persisted record authorizing an API caller.
///
/// The plaintext secret is never stored; a key is identified by the
/// digest of its secret. Timestamps are milliseconds since epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub id: String,
    /// The auth group this key belongs to; selects the API policy envelope.
    pub key_auth_id: String,
    pub workspace_id: String,
    /// Digest of the secret, see `infrastructure::keys::secret`.
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Opaque metadata, not consumed by the verification core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Soft-delete marker. A tombstoned key must miss on hash lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    /// Remaining verifications; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratelimit: Option<RatelimitPolicy>,
}

impl Key {
    pub fn new(
        id: impl Into<String>,
        key_auth_id: impl Into<String>,
        workspace_id: impl Into<String>,
        hash: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            key_auth_id: key_auth_id.into(),
            workspace_id: workspace_id.into(),
            hash: hash.into(),
            name: None,
            owner_id: None,
            meta: None,
            created_at,
            expires_at: None,
            deleted_at: None,
            remaining: None,
            ratelimit: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_remaining(mut self, remaining: i32) -> Self {
        self.remaining = Some(remaining);
        self
    }

    pub fn with_ratelimit(mut self, ratelimit: RatelimitPolicy) -> Self {
        self.ratelimit = Some(ratelimit);
        self
    }

    /// Whether the key expired at or before `now` (ms since epoch).
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> Key {
        Key::new("key_1", "ka_1", "ws_1", "hash", 1_700_000_000_000)
    }

    #[test]
    fn test_key_defaults() {
        let key = test_key();
        assert!(key.expires_at.is_none());
        assert!(key.remaining.is_none());
        assert!(key.ratelimit.is_none());
        assert!(!key.is_deleted());
    }

    #[test]
    fn test_key_expiration() {
        let key = test_key().with_expires_at(1000);
        assert!(!key.is_expired(999));
        assert!(key.is_expired(1000));
        assert!(key.is_expired(1001));

        let forever = test_key();
        assert!(!forever.is_expired(i64::MAX));
    }

    #[test]
    fn test_key_soft_delete_marker() {
        let mut key = test_key();
        key.deleted_at = Some(1_700_000_001_000);
        assert!(key.is_deleted());
    }

    #[test]
    fn test_ratelimit_policy_roundtrip() {
        let policy = RatelimitPolicy {
            variant: RatelimitVariant::Fast,
            limit: 10,
            refill_rate: 1,
            refill_interval: 1000,
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"fast\""));
        let back: RatelimitPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
