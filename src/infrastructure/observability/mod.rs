//! Observability infrastructure

mod metrics;

pub use metrics::{create_metrics_router, init_metrics, PrometheusMetrics};
