//! In-memory entity cache backed by moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{Cache, CacheStatus};

/// Configuration for the in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Lifetime of positive entries
    pub ttl: Duration,
    /// Lifetime of negative entries; must be shorter than `ttl` so an
    /// absent record does not shadow a freshly created one for long
    pub negative_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(60),
            negative_ttl: Duration::from_secs(10),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }
}

/// Cache slot. `value: None` is a negative entry.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: Option<V>,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with distinct positive and negative TTLs.
///
/// Entries carry their own deadline; moka's time-to-live only acts as a
/// backstop for eviction. Reads never block on the backing store.
#[derive(Debug)]
pub struct InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: MokaCache<String, Entry<V>>,
    config: InMemoryCacheConfig,
}

impl<V> InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let backstop = config.ttl.max(config.negative_ttl);
        let inner = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(backstop)
            .build();

        Self { inner, config }
    }
}

impl<V> Default for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> Cache<V> for InMemoryCache<V>
where
    V: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn get(&self, key: &str) -> (Option<V>, CacheStatus) {
        match self.inner.get(key).await {
            None => (None, CacheStatus::Miss),
            Some(entry) if Instant::now() >= entry.expires_at => {
                self.inner.invalidate(key).await;
                (None, CacheStatus::Miss)
            }
            Some(Entry { value: None, .. }) => (None, CacheStatus::NullHit),
            Some(Entry {
                value: Some(value), ..
            }) => (Some(value), CacheStatus::Hit),
        }
    }

    async fn set(&self, key: &str, value: V) {
        let entry = Entry {
            value: Some(value),
            expires_at: Instant::now() + self.config.ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
    }

    async fn set_null(&self, key: &str) {
        let entry = Entry {
            value: None,
            expires_at: Instant::now() + self.config.negative_ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_lived() -> InMemoryCache<String> {
        InMemoryCache::with_config(
            InMemoryCacheConfig::default()
                .with_ttl(Duration::from_millis(100))
                .with_negative_ttl(Duration::from_millis(40)),
        )
    }

    #[tokio::test]
    async fn test_miss_on_unknown_key() {
        let cache: InMemoryCache<String> = InMemoryCache::new();

        let (value, status) = cache.get("missing").await;
        assert!(value.is_none());
        assert_eq!(status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache.set("k", "v".to_string()).await;

        let (value, status) = cache.get("k").await;
        assert_eq!(value, Some("v".to_string()));
        assert_eq!(status, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_negative_entry() {
        let cache: InMemoryCache<String> = InMemoryCache::new();

        cache.set_null("absent").await;

        let (value, status) = cache.get("absent").await;
        assert!(value.is_none());
        assert_eq!(status, CacheStatus::NullHit);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = InMemoryCache::new();

        cache.set("k", "v".to_string()).await;
        cache.remove("k").await;

        let (_, status) = cache.get("k").await;
        assert_eq!(status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn test_positive_entry_expires() {
        let cache = short_lived();

        cache.set("k", "v".to_string()).await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let (_, status) = cache.get("k").await;
        assert_eq!(status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn test_negative_entry_expires_before_positive() {
        let cache = short_lived();

        cache.set("present", "v".to_string()).await;
        cache.set_null("absent").await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        // Negative entry is gone, positive entry still alive.
        let (_, status) = cache.get("absent").await;
        assert_eq!(status, CacheStatus::Miss);

        let (value, status) = cache.get("present").await;
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(value, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrites_negative_entry() {
        let cache = InMemoryCache::new();

        cache.set_null("k").await;
        cache.set("k", "v".to_string()).await;

        let (value, status) = cache.get("k").await;
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(value, Some("v".to_string()));
    }
}
