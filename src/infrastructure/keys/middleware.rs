//! Service middlewares
//!
//! Decorators over [`KeyServiceTrait`]; each wraps the previously built
//! service and must preserve both the response and the error channel
//! verbatim.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::domain::error::{DomainError, ErrorCode};

use super::service::{
    CreateKeyRequest, CreateKeyResponse, KeyServiceTrait, Middleware, SoftDeleteKeyRequest,
    SoftDeleteKeyResponse, VerifyKeyRequest, VerifyKeyResponse,
};

/// Logs one line per operation with latency and outcome. The plaintext
/// key never appears in any field.
pub struct LoggingMiddleware {
    inner: Arc<dyn KeyServiceTrait>,
}

impl LoggingMiddleware {
    pub fn wrap() -> Middleware {
        Box::new(|inner| Arc::new(Self { inner }))
    }
}

#[async_trait]
impl KeyServiceTrait for LoggingMiddleware {
    async fn verify_key(
        &self,
        request: VerifyKeyRequest,
    ) -> Result<VerifyKeyResponse, DomainError> {
        let started = Instant::now();
        let result = self.inner.verify_key(request).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => debug!(
                valid = response.valid,
                code = ?response.code,
                latency_ms,
                "verified key"
            ),
            Err(err) => warn!(error = %err, latency_ms, "verify key failed"),
        }
        result
    }

    async fn create_key(
        &self,
        request: CreateKeyRequest,
    ) -> Result<CreateKeyResponse, DomainError> {
        let started = Instant::now();
        let result = self.inner.create_key(request).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => info!(key_id = %response.key_id, latency_ms, "created key"),
            Err(err) => warn!(error = %err, latency_ms, "create key failed"),
        }
        result
    }

    async fn soft_delete_key(
        &self,
        request: SoftDeleteKeyRequest,
    ) -> Result<SoftDeleteKeyResponse, DomainError> {
        let started = Instant::now();
        let key_id = request.key_id.clone();
        let result = self.inner.soft_delete_key(request).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(key_id = %key_id, latency_ms, "soft deleted key"),
            Err(err) => warn!(key_id = %key_id, error = %err, latency_ms, "soft delete key failed"),
        }
        result
    }
}

/// Records per-operation counters and latency histograms.
pub struct MetricsMiddleware {
    inner: Arc<dyn KeyServiceTrait>,
}

impl MetricsMiddleware {
    pub fn wrap() -> Middleware {
        Box::new(|inner| Arc::new(Self { inner }))
    }
}

fn verification_outcome(result: &Result<VerifyKeyResponse, DomainError>) -> &'static str {
    match result {
        Ok(response) if response.valid => "valid",
        Ok(response) => match response.code {
            Some(ErrorCode::Ratelimited) => "ratelimited",
            Some(ErrorCode::UsageExceeded) => "usage_exceeded",
            Some(ErrorCode::Forbidden) => "forbidden",
            _ => "not_found",
        },
        Err(_) => "error",
    }
}

fn mutation_outcome<T>(result: &Result<T, DomainError>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}

#[async_trait]
impl KeyServiceTrait for MetricsMiddleware {
    async fn verify_key(
        &self,
        request: VerifyKeyRequest,
    ) -> Result<VerifyKeyResponse, DomainError> {
        let started = Instant::now();
        let result = self.inner.verify_key(request).await;

        counter!("keygate_key_verifications_total", "outcome" => verification_outcome(&result))
            .increment(1);
        histogram!("keygate_verify_key_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    async fn create_key(
        &self,
        request: CreateKeyRequest,
    ) -> Result<CreateKeyResponse, DomainError> {
        let result = self.inner.create_key(request).await;
        counter!("keygate_keys_created_total", "outcome" => mutation_outcome(&result))
            .increment(1);
        result
    }

    async fn soft_delete_key(
        &self,
        request: SoftDeleteKeyRequest,
    ) -> Result<SoftDeleteKeyResponse, DomainError> {
        let result = self.inner.soft_delete_key(request).await;
        counter!("keygate_keys_deleted_total", "outcome" => mutation_outcome(&result))
            .increment(1);
        result
    }
}
