//! Database collaborator trait

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::api::Api;
use crate::domain::key::Key;
use crate::domain::DomainError;

/// Persistence operations consumed by the key service.
///
/// Absence is `Ok(None)`, never an error; errors are reserved for
/// infrastructure failures. Uniqueness and ownership validation are the
/// store's responsibility.
#[async_trait]
pub trait Database: Send + Sync + Debug {
    async fn insert_key(&self, key: Key) -> Result<(), DomainError>;

    /// Tombstone a key. The row persists; hash lookups must then miss.
    async fn soft_delete_key(&self, key_id: &str) -> Result<(), DomainError>;

    /// Lookup by id. Returns tombstoned records as well, so callers can
    /// observe the deletion marker.
    async fn find_key_by_id(&self, key_id: &str) -> Result<Option<Key>, DomainError>;

    /// Lookup by secret digest. Tombstoned records do not match.
    async fn find_key_by_hash(&self, hash: &str) -> Result<Option<Key>, DomainError>;

    async fn find_api_by_key_auth_id(&self, key_auth_id: &str)
        -> Result<Option<Api>, DomainError>;

    /// Atomically decrement the remaining-usage counter and return the
    /// post-decrement record.
    async fn decrement_remaining_key_usage(&self, key_id: &str) -> Result<Key, DomainError>;
}
