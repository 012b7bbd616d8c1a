use serde::Deserialize;
use std::time::Duration;

use crate::services::expansion::ExpansionSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Catalog Web API base URL
    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    /// Bearer token for the catalog Web API
    pub catalog_access_token: String,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Persist recommended ids per user so suggestions never repeat across sessions
    #[serde(default = "default_history_enabled")]
    pub history_enabled: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Catalog items shorter than this are treated as singles and never suggested
    #[serde(default = "default_min_item_duration_minutes")]
    pub min_item_duration_minutes: u64,

    /// Maximum number of seed ids a technique consumes per page
    #[serde(default = "default_seed_batch_size")]
    pub seed_batch_size: usize,

    /// Track limit passed to seed-based recommendation calls
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    #[serde(default = "default_readiness_poll_interval_ms")]
    pub readiness_poll_interval_ms: u64,

    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Idle minutes after which an expansion session is dropped
    #[serde(default = "default_session_idle_timeout_minutes")]
    pub session_idle_timeout_minutes: u64,
}

fn default_catalog_api_url() -> String {
    "https://api.spotify.com".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_history_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_min_item_duration_minutes() -> u64 {
    15
}

fn default_seed_batch_size() -> usize {
    10
}

fn default_recommendation_limit() -> usize {
    15
}

fn default_readiness_poll_interval_ms() -> u64 {
    250
}

fn default_readiness_timeout_ms() -> u64 {
    3000
}

fn default_session_idle_timeout_minutes() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Tuning knobs for library-expansion sessions
    pub fn expansion_settings(&self) -> ExpansionSettings {
        ExpansionSettings {
            min_item_duration: Duration::from_secs(self.min_item_duration_minutes * 60),
            seed_batch_size: self.seed_batch_size,
            recommendation_limit: self.recommendation_limit,
            readiness_poll_interval: Duration::from_millis(self.readiness_poll_interval_ms),
            readiness_timeout: Duration::from_millis(self.readiness_timeout_ms),
            session_idle_timeout: Duration::from_secs(self.session_idle_timeout_minutes * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_when_only_token_is_set() {
        let vars = vec![(
            "CATALOG_ACCESS_TOKEN".to_string(),
            "secret".to_string(),
        )];
        let config: Config = tokio_test::assert_ok!(envy::from_iter(vars));

        assert_eq!(config.catalog_api_url, "https://api.spotify.com");
        assert_eq!(config.port, 3000);
        assert!(config.history_enabled);
        assert_eq!(config.min_item_duration_minutes, 15);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let vars: Vec<(String, String)> = vec![];
        tokio_test::assert_err!(envy::from_iter::<_, Config>(vars));
    }

    #[test]
    fn test_expansion_settings_conversion() {
        let vars = vec![
            ("CATALOG_ACCESS_TOKEN".to_string(), "secret".to_string()),
            ("MIN_ITEM_DURATION_MINUTES".to_string(), "20".to_string()),
            ("READINESS_TIMEOUT_MS".to_string(), "500".to_string()),
            ("SESSION_IDLE_TIMEOUT_MINUTES".to_string(), "5".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        let settings = config.expansion_settings();

        assert_eq!(settings.min_item_duration, Duration::from_secs(20 * 60));
        assert_eq!(settings.readiness_timeout, Duration::from_millis(500));
        assert_eq!(settings.seed_batch_size, 10);
        assert_eq!(settings.session_idle_timeout, Duration::from_secs(5 * 60));
    }
}
