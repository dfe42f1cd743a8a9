//! Pass-through cache

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::domain::cache::{Cache, CacheStatus};

/// A cache that always misses and swallows writes.
///
/// Installed when no cache is configured, so the service pipeline has the
/// same shape with and without caching.
#[derive(Default)]
pub struct NoopCache<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> std::fmt::Debug for NoopCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopCache").finish()
    }
}

impl<V> NoopCache<V> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<V> Cache<V> for NoopCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, _key: &str) -> (Option<V>, CacheStatus) {
        (None, CacheStatus::Miss)
    }

    async fn set(&self, _key: &str, _value: V) {}

    async fn set_null(&self, _key: &str) {}

    async fn remove(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_misses() {
        let cache: NoopCache<String> = NoopCache::new();

        cache.set("k", "v".to_string()).await;
        cache.set_null("k").await;

        let (value, status) = cache.get("k").await;
        assert!(value.is_none());
        assert_eq!(status, CacheStatus::Miss);
    }
}
