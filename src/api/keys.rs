//! Key endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::infrastructure::keys::{
    CreateKeyRequest, CreateKeyResponse, SoftDeleteKeyRequest, SoftDeleteKeyResponse,
    VerifyKeyRequest, VerifyKeyResponse,
};

use super::error::ApiError;
use super::state::AppState;

/// POST /v1/keys/verify
pub async fn verify_key(
    State(state): State<AppState>,
    Json(request): Json<VerifyKeyRequest>,
) -> Result<Json<VerifyKeyResponse>, ApiError> {
    let response = state.keys.verify_key(request).await?;
    Ok(Json(response))
}

/// POST /v1/keys
pub async fn create_key(
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<CreateKeyResponse>), ApiError> {
    let response = state.keys.create_key(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /v1/keys/:key_id
pub async fn soft_delete_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<SoftDeleteKeyResponse>, ApiError> {
    let response = state
        .keys
        .soft_delete_key(SoftDeleteKeyRequest { key_id })
        .await?;
    Ok(Json(response))
}
