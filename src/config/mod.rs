mod app_config;

pub use app_config::{
    AnalyticsSettings, AppConfig, CacheSettings, LogFormat, LoggingSettings, MetricsSettings,
    ServerConfig,
};
