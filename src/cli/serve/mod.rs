//! Serve command - wires the collaborators and runs the HTTP server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::domain::api::Api;
use crate::domain::key::Key;
use crate::infrastructure::analytics::BufferedAnalytics;
use crate::infrastructure::cache::{InMemoryCache, InMemoryCacheConfig};
use crate::infrastructure::database::InMemoryDatabase;
use crate::infrastructure::events::BroadcastEventBus;
use crate::infrastructure::keys::{
    KeyService, KeyServiceConfig, LoggingMiddleware, MetricsMiddleware,
};
use crate::infrastructure::logging;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};
use crate::infrastructure::ratelimit::TokenBucketRatelimiter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config);

    let metrics = init_metrics(&config.metrics);

    let state = create_app_state(&config);
    let mut app = create_router(state);
    if let Some(metrics) = metrics {
        app = app.merge(create_metrics_router(metrics));
    }

    let addr = build_socket_addr(&config)?;
    info!("Starting key service on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &AppConfig) {
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

fn create_app_state(config: &AppConfig) -> AppState {
    // The in-memory adapter is the only database shipped with this binary.
    // Production deployments supply a persistent adapter behind the same
    // trait.
    warn!("Using the in-memory database adapter; keys will not survive restarts");
    let database = Arc::new(InMemoryDatabase::new());

    let cache_config = InMemoryCacheConfig::default()
        .with_max_capacity(config.cache.max_capacity)
        .with_ttl(Duration::from_secs(config.cache.ttl_secs))
        .with_negative_ttl(Duration::from_secs(config.cache.negative_ttl_secs));

    let keys = KeyService::build(
        KeyServiceConfig {
            database,
            events: Arc::new(BroadcastEventBus::default()),
            key_cache: Some(Arc::new(InMemoryCache::<Key>::with_config(
                cache_config.clone(),
            ))),
            api_cache: Some(Arc::new(InMemoryCache::<Api>::with_config(cache_config))),
            analytics: Arc::new(BufferedAnalytics::spawn(config.analytics.buffer)),
            memory_ratelimit: Arc::new(TokenBucketRatelimiter::new()),
            // Single-node deployment: the consistent limiter is served by
            // a second local bucket until a cluster coordinator is wired.
            consistent_ratelimit: Arc::new(TokenBucketRatelimiter::new()),
        },
        vec![LoggingMiddleware::wrap(), MetricsMiddleware::wrap()],
    );

    AppState::new(keys)
}
