//! In-memory database adapter
//!
//! Backing store for tests and single-node deployments. A production
//! deployment plugs a real store in behind the `Database` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::api::Api;
use crate::domain::database::Database;
use crate::domain::key::Key;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    /// Keys by id; tombstoned rows stay in the map.
    keys: RwLock<HashMap<String, Key>>,
    /// APIs by key_auth_id, mirroring the read path of the service.
    apis: RwLock<HashMap<String, Api>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// APIs are created out of band in the real system; this is the
    /// out-of-band channel for tests and seeding.
    pub async fn insert_api(&self, api: Api) -> Result<(), DomainError> {
        let mut apis = self.apis.write().await;
        if apis.contains_key(&api.key_auth_id) {
            return Err(DomainError::conflict(format!(
                "api for key auth '{}' already exists",
                api.key_auth_id
            )));
        }
        apis.insert(api.key_auth_id.clone(), api);
        Ok(())
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn insert_key(&self, key: Key) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;

        if keys.contains_key(&key.id) {
            return Err(DomainError::conflict(format!(
                "key '{}' already exists",
                key.id
            )));
        }
        // A hash maps to at most one non-deleted key.
        if keys
            .values()
            .any(|existing| !existing.is_deleted() && existing.hash == key.hash)
        {
            return Err(DomainError::conflict(format!(
                "a key with the same hash already exists in key auth '{}'",
                key.key_auth_id
            )));
        }

        keys.insert(key.id.clone(), key);
        Ok(())
    }

    async fn soft_delete_key(&self, key_id: &str) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;
        let key = keys
            .get_mut(key_id)
            .ok_or_else(|| DomainError::not_found(format!("key '{}' not found", key_id)))?;

        if key.deleted_at.is_none() {
            key.deleted_at = Some(Utc::now().timestamp_millis());
        }
        Ok(())
    }

    async fn find_key_by_id(&self, key_id: &str) -> Result<Option<Key>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(key_id).cloned())
    }

    async fn find_key_by_hash(&self, hash: &str) -> Result<Option<Key>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys
            .values()
            .find(|key| !key.is_deleted() && key.hash == hash)
            .cloned())
    }

    async fn find_api_by_key_auth_id(
        &self,
        key_auth_id: &str,
    ) -> Result<Option<Api>, DomainError> {
        let apis = self.apis.read().await;
        Ok(apis.get(key_auth_id).cloned())
    }

    async fn decrement_remaining_key_usage(&self, key_id: &str) -> Result<Key, DomainError> {
        let mut keys = self.keys.write().await;
        let key = keys
            .get_mut(key_id)
            .ok_or_else(|| DomainError::not_found(format!("key '{}' not found", key_id)))?;

        if let Some(remaining) = key.remaining {
            key.remaining = Some(remaining - 1);
        }
        Ok(key.clone())
    }
}
