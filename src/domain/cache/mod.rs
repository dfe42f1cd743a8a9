//! Entity cache trait
//!
//! Read-through cache consumed by the verification hot path. Negative
//! results are cached too, with a shorter lifetime than positive entries,
//! so repeated probes for unknown hashes stay off the database.

use std::fmt::Debug;

use async_trait::async_trait;

/// Outcome of a cache read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// A positive entry was found.
    Hit,
    /// Nothing is known about the key; consult the database.
    Miss,
    /// The key was recently looked up and did not exist.
    NullHit,
}

/// Cache over a single entity type.
///
/// Operations are infallible: a broken cache degrades to a miss, it never
/// fails a verification. Implementations must be internally synchronized;
/// writes may complete asynchronously.
#[async_trait]
pub trait Cache<V>: Send + Sync + Debug
where
    V: Clone + Send + Sync + 'static,
{
    /// Read an entry. The status disambiguates "not cached" from
    /// "cached as absent".
    async fn get(&self, key: &str) -> (Option<V>, CacheStatus);

    /// Store a positive entry.
    async fn set(&self, key: &str, value: V);

    /// Store a negative entry with the shorter negative TTL.
    async fn set_null(&self, key: &str);

    /// Drop an entry, positive or negative.
    async fn remove(&self, key: &str);
}
