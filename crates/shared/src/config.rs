//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// External provider configuration.
    #[serde(default)]
    pub providers: ProviderConfig,
    /// Settlement reconciler configuration.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// External provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Selected transfer provider ("mock" or "rest").
    #[serde(default = "default_provider_kind")]
    pub transfer: String,
    /// Selected bank-verification provider ("mock" or "rest").
    #[serde(default = "default_provider_kind")]
    pub verification: String,
    /// Base URL for REST providers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API secret for REST providers.
    #[serde(default)]
    pub secret: Option<String>,
}

fn default_provider_kind() -> String {
    "mock".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            transfer: default_provider_kind(),
            verification: default_provider_kind(),
            base_url: None,
            secret: None,
        }
    }
}

/// Settlement reconciler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Entries pending longer than this are requeried, in seconds.
    #[serde(default = "default_requery_after")]
    pub requery_after_secs: u64,
    /// Requery worker poll interval, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Rolling duplicate-submission window, in seconds.
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window_secs: u64,
}

fn default_requery_after() -> u64 {
    3600 // 1 hour
}

fn default_poll_interval() -> u64 {
    60
}

fn default_duplicate_window() -> u64 {
    60
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            requery_after_secs: default_requery_after(),
            poll_interval_secs: default_poll_interval(),
            duplicate_window_secs: default_duplicate_window(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("VELORA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciler_defaults() {
        let cfg = ReconcilerConfig::default();
        assert_eq!(cfg.requery_after_secs, 3600);
        assert_eq!(cfg.poll_interval_secs, 60);
        assert_eq!(cfg.duplicate_window_secs, 60);
    }

    #[test]
    fn test_provider_defaults_to_mock() {
        let cfg = ProviderConfig::default();
        assert_eq!(cfg.transfer, "mock");
        assert_eq!(cfg.verification, "mock");
        assert!(cfg.base_url.is_none());
        assert!(cfg.secret.is_none());
    }
}
