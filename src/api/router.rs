//! HTTP router

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::{health, keys, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/keys/verify", post(keys::verify_key))
        .route("/v1/keys", post(keys::create_key))
        .route("/v1/keys/:key_id", delete(keys::soft_delete_key))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
