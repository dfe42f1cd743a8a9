//! Rate limiter collaborator trait

use async_trait::async_trait;
use std::fmt::Debug;

/// A token request against one bucket.
///
/// The bucket identity is the identifier plus the policy parameters, so a
/// policy change starts a fresh bucket instead of inheriting stale state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatelimitRequest {
    pub identifier: String,
    /// Bucket capacity.
    pub limit: i32,
    /// Tokens added per refill interval.
    pub refill_rate: i32,
    /// Refill interval in milliseconds.
    pub refill_interval: i64,
}

/// Result of taking a token. Returned on denials too, so callers can
/// surface backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatelimitResponse {
    pub pass: bool,
    pub limit: i32,
    pub remaining: i32,
    /// Milliseconds since epoch at which the bucket refills.
    pub reset_at: i64,
}

/// Token-bucket rate limiter.
///
/// Two instances are injected into the service: a node-local one for the
/// `fast` policy variant and a cluster-coordinated one for `consistent`.
/// Both honor the same contract; atomicity per bucket is the limiter's
/// responsibility.
#[async_trait]
pub trait Ratelimiter: Send + Sync + Debug {
    async fn take(&self, request: RatelimitRequest) -> RatelimitResponse;
}
