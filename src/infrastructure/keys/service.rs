//! Key service
//!
//! The verification core: resolves keys and their API envelope through
//! read-through caches, applies policy checks in a fixed order, accounts
//! rate limits before any quota decrement, and reports every resolved
//! verification to the analytics sink without blocking on it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::analytics::{Analytics, DeniedReason, KeyVerificationEvent};
use crate::domain::api::Api;
use crate::domain::cache::{Cache, CacheStatus};
use crate::domain::database::Database;
use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::events::{EventBus, KeyEvent};
use crate::domain::key::{Key, RatelimitPolicy, RatelimitState, RatelimitVariant};
use crate::domain::ratelimit::{RatelimitRequest, Ratelimiter};
use crate::infrastructure::cache::NoopCache;

use super::secret;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyKeyRequest {
    /// The plaintext secret presented by the caller. Never logged, never
    /// stored; hashed immediately.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Advisory: the API the caller believes it is talking to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
}

/// Verification outcome. `valid = false` with a code is a regular
/// response, not an error; callers branch on `code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyKeyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratelimit: Option<RatelimitState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl VerifyKeyResponse {
    fn not_found() -> Self {
        Self {
            code: Some(ErrorCode::NotFound),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateKeyRequest {
    pub key_auth_id: String,
    pub workspace_id: String,
    /// Plaintext secret to hash and persist. Mutually exclusive with
    /// `hash`; when both are absent a secret is generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<String>,
    /// Pre-hashed secret from an upstream issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Prefix for generated secrets, e.g. "kg_live".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratelimit: Option<RatelimitPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateKeyResponse {
    pub key_id: String,
    /// The plaintext secret, returned exactly once when the service
    /// hashed or generated it. Absent for pre-hashed records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftDeleteKeyRequest {
    pub key_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoftDeleteKeyResponse {}

/// The service contract. Middlewares wrap it; transports call it.
#[async_trait]
pub trait KeyServiceTrait: Send + Sync {
    async fn verify_key(&self, request: VerifyKeyRequest)
        -> Result<VerifyKeyResponse, DomainError>;

    async fn create_key(&self, request: CreateKeyRequest)
        -> Result<CreateKeyResponse, DomainError>;

    async fn soft_delete_key(
        &self,
        request: SoftDeleteKeyRequest,
    ) -> Result<SoftDeleteKeyResponse, DomainError>;
}

/// A decorator over the service contract. The first middleware in the
/// list handed to [`KeyService::build`] is the outermost at call time.
pub type Middleware = Box<dyn FnOnce(Arc<dyn KeyServiceTrait>) -> Arc<dyn KeyServiceTrait> + Send>;

/// Collaborator bundle for [`KeyService::build`]. Caches are optional;
/// when unset, a pass-through cache keeps the pipeline shape identical.
pub struct KeyServiceConfig {
    pub database: Arc<dyn Database>,
    pub events: Arc<dyn EventBus>,
    pub key_cache: Option<Arc<dyn Cache<Key>>>,
    pub api_cache: Option<Arc<dyn Cache<Api>>>,
    pub analytics: Arc<dyn Analytics>,
    pub memory_ratelimit: Arc<dyn Ratelimiter>,
    pub consistent_ratelimit: Arc<dyn Ratelimiter>,
}

/// The base implementation. Holds no mutable state of its own; all
/// interior mutability lives in the collaborators, so a single instance
/// serves any number of concurrent callers.
pub struct KeyService {
    db: Arc<dyn Database>,
    events: Arc<dyn EventBus>,
    key_cache: Arc<dyn Cache<Key>>,
    api_cache: Arc<dyn Cache<Api>>,
    analytics: Arc<dyn Analytics>,
    memory_ratelimit: Arc<dyn Ratelimiter>,
    consistent_ratelimit: Arc<dyn Ratelimiter>,
}

impl KeyService {
    /// Wire the base service and wrap it in the given middlewares, first
    /// middleware outermost.
    pub fn build(config: KeyServiceConfig, middlewares: Vec<Middleware>) -> Arc<dyn KeyServiceTrait> {
        let service: Arc<dyn KeyServiceTrait> = Arc::new(Self {
            db: config.database,
            events: config.events,
            key_cache: config
                .key_cache
                .unwrap_or_else(|| Arc::new(NoopCache::new())),
            api_cache: config
                .api_cache
                .unwrap_or_else(|| Arc::new(NoopCache::new())),
            analytics: config.analytics,
            memory_ratelimit: config.memory_ratelimit,
            consistent_ratelimit: config.consistent_ratelimit,
        });

        middlewares
            .into_iter()
            .rev()
            .fold(service, |service, middleware| middleware(service))
    }

    async fn resolve_key(&self, hash: &str) -> Result<Option<Key>, DomainError> {
        let (cached, status) = self.key_cache.get(hash).await;
        match status {
            CacheStatus::Hit => Ok(cached),
            CacheStatus::NullHit => Ok(None),
            CacheStatus::Miss => {
                let found = self.db.find_key_by_hash(hash).await.map_err(|err| {
                    warn!(error = %err, "key lookup failed");
                    err
                })?;
                match found {
                    Some(key) => {
                        self.key_cache.set(hash, key.clone()).await;
                        Ok(Some(key))
                    }
                    None => {
                        self.key_cache.set_null(hash).await;
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn resolve_api(&self, key_auth_id: &str) -> Result<Option<Api>, DomainError> {
        let (cached, status) = self.api_cache.get(key_auth_id).await;
        match status {
            CacheStatus::Hit => Ok(cached),
            CacheStatus::NullHit => Ok(None),
            CacheStatus::Miss => {
                let found = self
                    .db
                    .find_api_by_key_auth_id(key_auth_id)
                    .await
                    .map_err(|err| {
                        warn!(key_auth_id, error = %err, "api lookup failed");
                        err
                    })?;
                match found {
                    Some(api) => {
                        self.api_cache.set(key_auth_id, api.clone()).await;
                        Ok(Some(api))
                    }
                    None => {
                        self.api_cache.set_null(key_auth_id).await;
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn publish_verification(
        &self,
        key: &Key,
        api: &Api,
        request: &VerifyKeyRequest,
        denied: Option<DeniedReason>,
    ) {
        self.analytics
            .publish_key_verification_event(KeyVerificationEvent {
                workspace_id: key.workspace_id.clone(),
                api_id: api.id.clone(),
                key_id: key.id.clone(),
                denied,
                ip_address: request.source_ip.clone(),
                user_agent: request.user_agent.clone(),
                time: now_ms(),
            })
            .await;
    }
}

#[async_trait]
impl KeyServiceTrait for KeyService {
    async fn verify_key(
        &self,
        request: VerifyKeyRequest,
    ) -> Result<VerifyKeyResponse, DomainError> {
        if request.key.is_empty() {
            return Err(DomainError::bad_request("key must not be empty"));
        }

        let hash = secret::hash_secret(&request.key);

        let key = match self.resolve_key(&hash).await? {
            Some(key) => key,
            None => return Ok(VerifyKeyResponse::not_found()),
        };

        // The store filters tombstones, but a stale cache entry may still
        // carry one; the marker wins and the entry is evicted.
        if key.is_deleted() {
            self.key_cache.remove(&hash).await;
            return Ok(VerifyKeyResponse::not_found());
        }

        let api = match self.resolve_api(&key.key_auth_id).await? {
            Some(api) => api,
            None => return Ok(VerifyKeyResponse::not_found()),
        };

        let mut response = VerifyKeyResponse::default();

        if !api.allows_ip(request.source_ip.as_deref()) {
            response.code = Some(ErrorCode::Forbidden);
            self.publish_verification(&key, &api, &request, Some(DeniedReason::Forbidden))
                .await;
            return Ok(response);
        }

        if key.is_expired(now_ms()) {
            // Expired keys are indistinguishable from absent ones.
            response.code = Some(ErrorCode::NotFound);
            self.publish_verification(&key, &api, &request, Some(DeniedReason::Expired))
                .await;
            return Ok(response);
        }

        if let Some(policy) = &key.ratelimit {
            let limiter = match policy.variant {
                RatelimitVariant::Fast => &self.memory_ratelimit,
                RatelimitVariant::Consistent => &self.consistent_ratelimit,
            };
            let taken = limiter
                .take(RatelimitRequest {
                    identifier: key.id.clone(),
                    limit: policy.limit,
                    refill_rate: policy.refill_rate,
                    refill_interval: policy.refill_interval,
                })
                .await;

            // Echoed on denials too, so callers can surface backoff.
            response.ratelimit = Some(RatelimitState {
                limit: taken.limit,
                remaining: taken.remaining,
                reset_at: taken.reset_at,
            });

            if !taken.pass {
                response.code = Some(ErrorCode::Ratelimited);
                self.publish_verification(&key, &api, &request, Some(DeniedReason::Ratelimited))
                    .await;
                return Ok(response);
            }
        }

        if let Some(remaining) = key.remaining {
            if remaining <= 0 {
                response.remaining = Some(0);
                response.code = Some(ErrorCode::UsageExceeded);
                self.publish_verification(&key, &api, &request, Some(DeniedReason::UsageExceeded))
                    .await;
                return Ok(response);
            }

            let updated = self
                .db
                .decrement_remaining_key_usage(&key.id)
                .await
                .map_err(|err| {
                    warn!(key_id = %key.id, error = %err, "failed to decrement remaining usage");
                    err
                })?;
            self.key_cache.set(&hash, updated.clone()).await;

            let after = updated.remaining.unwrap_or(0);
            if after < 0 {
                // Lost a race for the last use; the decrement stands but
                // this call is not admitted.
                response.remaining = Some(0);
                response.code = Some(ErrorCode::UsageExceeded);
                self.publish_verification(&key, &api, &request, Some(DeniedReason::UsageExceeded))
                    .await;
                return Ok(response);
            }
            response.remaining = Some(after);
        }

        response.valid = true;
        response.key_id = Some(key.id.clone());
        response.workspace_id = Some(key.workspace_id.clone());
        response.api_id = Some(api.id.clone());
        response.owner_id = key.owner_id.clone();
        response.name = key.name.clone();
        response.expires = key.expires_at;

        self.publish_verification(&key, &api, &request, None).await;

        Ok(response)
    }

    async fn create_key(
        &self,
        request: CreateKeyRequest,
    ) -> Result<CreateKeyResponse, DomainError> {
        if request.key_auth_id.is_empty() {
            return Err(DomainError::bad_request("key_auth_id must not be empty"));
        }
        if request.workspace_id.is_empty() {
            return Err(DomainError::bad_request("workspace_id must not be empty"));
        }

        let (hash, plaintext) = match (request.plaintext, request.hash) {
            (Some(plaintext), _) => {
                if plaintext.is_empty() {
                    return Err(DomainError::bad_request("plaintext must not be empty"));
                }
                (secret::hash_secret(&plaintext), Some(plaintext))
            }
            (None, Some(hash)) => (hash, None),
            (None, None) => {
                let plaintext = secret::generate_secret(
                    request.prefix.as_deref(),
                    request.byte_length.unwrap_or(secret::DEFAULT_SECRET_BYTES),
                );
                (secret::hash_secret(&plaintext), Some(plaintext))
            }
        };

        let key_id = secret::new_key_id();
        let mut key = Key::new(
            key_id.as_str(),
            request.key_auth_id,
            request.workspace_id,
            hash.as_str(),
            now_ms(),
        );
        key.name = request.name;
        key.owner_id = request.owner_id;
        key.meta = request.meta;
        key.expires_at = request.expires_at;
        key.remaining = request.remaining;
        key.ratelimit = request.ratelimit;

        self.db.insert_key(key).await.map_err(|err| {
            warn!(key_id = %key_id, error = %err, "failed to insert key");
            err
        })?;

        // A recent failed verification may have cached this hash as
        // absent; the new record must become visible immediately.
        self.key_cache.remove(&hash).await;

        self.events
            .emit_key_event(KeyEvent::Created {
                key_id: key_id.clone(),
                hash,
            })
            .await;

        Ok(CreateKeyResponse { key_id, plaintext })
    }

    async fn soft_delete_key(
        &self,
        request: SoftDeleteKeyRequest,
    ) -> Result<SoftDeleteKeyResponse, DomainError> {
        let key = self
            .db
            .find_key_by_id(&request.key_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("key '{}' not found", request.key_id))
            })?;

        self.db
            .soft_delete_key(&request.key_id)
            .await
            .map_err(|err| {
                warn!(key_id = %request.key_id, error = %err, "failed to soft delete key");
                err
            })?;

        // Drop the positive entry; the API envelope is shared with other
        // keys and stays cached.
        self.key_cache.remove(&key.hash).await;

        self.events
            .emit_key_event(KeyEvent::Deleted {
                key_id: key.id,
                hash: key.hash,
            })
            .await;

        Ok(SoftDeleteKeyResponse {})
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
