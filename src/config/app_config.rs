use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings for the key and API entity caches
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub max_capacity: u64,
    /// Lifetime of positive entries, seconds
    pub ttl_secs: u64,
    /// Lifetime of negative entries, seconds; keep this short so a
    /// freshly created key is not shadowed by an earlier failed lookup
    pub negative_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSettings {
    /// Capacity of the in-memory event buffer
    pub buffer: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl_secs: 60,
            negative_ttl_secs: 10,
        }
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self { buffer: 4096 }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.cache.negative_ttl_secs < config.cache.ttl_secs);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AppConfig = serde_json::from_str(r#"{"server":{"host":"127.0.0.1","port":9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.max_capacity, 10_000);
    }
}
