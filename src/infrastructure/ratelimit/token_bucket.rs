//! Node-local token-bucket rate limiter

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::ratelimit::{RatelimitRequest, RatelimitResponse, Ratelimiter};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: i32,
    /// Milliseconds since epoch at which the next refill happens.
    reset_at: i64,
}

/// Strictly node-local token bucket.
///
/// A fresh bucket starts full. Once `reset_at` passes, `refill_rate`
/// tokens are added per elapsed interval, capped at `limit`. The check
/// and the token take happen under one lock, so concurrent callers of
/// the same bucket never overdraw it.
#[derive(Debug, Default)]
pub struct TokenBucketRatelimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenBucketRatelimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_key(request: &RatelimitRequest) -> String {
        format!(
            "{}:{}:{}:{}",
            request.identifier, request.limit, request.refill_rate, request.refill_interval
        )
    }
}

#[async_trait]
impl Ratelimiter for TokenBucketRatelimiter {
    async fn take(&self, request: RatelimitRequest) -> RatelimitResponse {
        let now = Utc::now().timestamp_millis();
        let interval = request.refill_interval.max(1);

        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(Self::bucket_key(&request))
            .or_insert(Bucket {
                tokens: request.limit,
                reset_at: now + interval,
            });

        if now >= bucket.reset_at {
            let elapsed_intervals = 1 + (now - bucket.reset_at) / interval;
            let refill = request
                .refill_rate
                .saturating_mul(elapsed_intervals.min(i32::MAX as i64) as i32);
            bucket.tokens = bucket.tokens.saturating_add(refill).min(request.limit);
            bucket.reset_at = now + interval;
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            RatelimitResponse {
                pass: true,
                limit: request.limit,
                remaining: bucket.tokens,
                reset_at: bucket.reset_at,
            }
        } else {
            RatelimitResponse {
                pass: false,
                limit: request.limit,
                remaining: 0,
                reset_at: bucket.reset_at,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(identifier: &str, limit: i32, refill_rate: i32, interval_ms: i64) -> RatelimitRequest {
        RatelimitRequest {
            identifier: identifier.to_string(),
            limit,
            refill_rate,
            refill_interval: interval_ms,
        }
    }

    #[tokio::test]
    async fn test_fresh_bucket_starts_full() {
        let limiter = TokenBucketRatelimiter::new();

        let res = limiter.take(request("k", 5, 1, 10_000)).await;
        assert!(res.pass);
        assert_eq!(res.limit, 5);
        assert_eq!(res.remaining, 4);
        assert!(res.reset_at > Utc::now().timestamp_millis());
    }

    #[tokio::test]
    async fn test_denies_when_empty() {
        let limiter = TokenBucketRatelimiter::new();

        let first = limiter.take(request("k", 2, 1, 10_000)).await;
        let second = limiter.take(request("k", 2, 1, 10_000)).await;
        let third = limiter.take(request("k", 2, 1, 10_000)).await;

        assert!(first.pass);
        assert_eq!(first.remaining, 1);
        assert!(second.pass);
        assert_eq!(second.remaining, 0);
        assert!(!third.pass);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_at, first.reset_at);
    }

    #[tokio::test]
    async fn test_refills_after_reset() {
        let limiter = TokenBucketRatelimiter::new();

        limiter.take(request("k", 2, 1, 200)).await;
        limiter.take(request("k", 2, 1, 200)).await;
        let denied = limiter.take(request("k", 2, 1, 200)).await;
        assert!(!denied.pass);

        let wait = denied.reset_at - Utc::now().timestamp_millis();
        tokio::time::sleep(Duration::from_millis(wait.max(0) as u64 + 20)).await;

        // One token refilled, consumed by this call.
        let after = limiter.take(request("k", 2, 1, 200)).await;
        assert!(after.pass);
        assert_eq!(after.remaining, 0);
    }

    #[tokio::test]
    async fn test_refill_is_capped_at_limit() {
        let limiter = TokenBucketRatelimiter::new();

        limiter.take(request("k", 2, 10, 100)).await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let res = limiter.take(request("k", 2, 10, 100)).await;
        assert!(res.pass);
        // Capped at limit 2, minus the token just taken.
        assert_eq!(res.remaining, 1);
    }

    #[tokio::test]
    async fn test_buckets_are_isolated_per_identifier() {
        let limiter = TokenBucketRatelimiter::new();

        let exhausted = limiter.take(request("a", 1, 1, 10_000)).await;
        assert!(exhausted.pass);
        assert!(!limiter.take(request("a", 1, 1, 10_000)).await.pass);

        assert!(limiter.take(request("b", 1, 1, 10_000)).await.pass);
    }

    #[tokio::test]
    async fn test_policy_change_starts_a_fresh_bucket() {
        let limiter = TokenBucketRatelimiter::new();

        assert!(limiter.take(request("k", 1, 1, 10_000)).await.pass);
        assert!(!limiter.take(request("k", 1, 1, 10_000)).await.pass);

        // Same identifier, different limit: separate bucket.
        assert!(limiter.take(request("k", 3, 1, 10_000)).await.pass);
    }
}
