//! Key verification service, its middlewares and secret handling

pub mod middleware;
pub mod secret;
pub mod service;

pub use middleware::{LoggingMiddleware, MetricsMiddleware};
pub use service::{
    CreateKeyRequest, CreateKeyResponse, KeyService, KeyServiceConfig, KeyServiceTrait,
    Middleware, SoftDeleteKeyRequest, SoftDeleteKeyResponse, VerifyKeyRequest, VerifyKeyResponse,
};
