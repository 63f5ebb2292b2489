//! Configuration parsing and validation for MarketSync
//!
//! Configuration is a single YAML file, loaded with environment variable
//! substitution (`${VAR}` or `$VAR`), then validated. Secrets such as the
//! provider API key are expected to come from the environment.
//!
//! # Quick Start
//!
//! ```ignore
//! use config::{load_config, validate_config};
//!
//! let cfg = load_config("marketsync.yaml")?;
//! let report = validate_config(&cfg);
//! if !report.is_valid() {
//!     anyhow::bail!("invalid configuration");
//! }
//! ```

pub mod parser;
pub mod substitution;
pub mod validator;

pub use parser::{generate_default_config, load_config, save_config};
pub use substitution::{has_unresolved_env_vars, substitute_env_vars};
pub use validator::{validate_config, AppliedDefault, ValidationIssue, ValidationReport};

use serde::{Deserialize, Serialize};

/// Top-level collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Optional Postgres storage; the in-memory store is used when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Service identity and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// One of "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_format: default_log_format(),
        }
    }
}

/// Upstream market-data provider endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key; use `${POLYGON_API_KEY}` in the YAML file
    pub api_key: String,
    #[serde(default = "default_realtime_ws_url")]
    pub realtime_ws_url: String,
    #[serde(default = "default_delayed_ws_url")]
    pub delayed_ws_url: String,
}

/// HTTP fetch layer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Fixed delay before every outbound request, in milliseconds
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Response cache TTL in seconds; 0 disables caching
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Total attempts per request when rate limited
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Synchronizer pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Symbols to keep synchronized
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Seconds between scheduled sync passes
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,
    /// Initial history window for daily bars, in days
    #[serde(default = "default_daily_lookback_days")]
    pub daily_lookback_days: i64,
    /// Initial history window for minute bars, in days
    #[serde(default = "default_minute_lookback_days")]
    pub minute_lookback_days: i64,
    /// Realtime quote staleness window, in milliseconds
    #[serde(default = "default_quote_ttl_ms")]
    pub quote_ttl_ms: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            interval_secs: default_sync_interval_secs(),
            daily_lookback_days: default_daily_lookback_days(),
            minute_lookback_days: default_minute_lookback_days(),
            quote_ttl_ms: default_quote_ttl_ms(),
        }
    }
}

/// WebSocket streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Starting feed tier: "realtime" or "delayed"
    #[serde(default = "default_stream_tier")]
    pub tier: String,
    /// Trade size at or above which an alert is emitted
    #[serde(default = "default_alert_trade_size")]
    pub alert_trade_size: f64,
    /// Stop after the first connection instead of reconnecting
    /// (testing/diagnostics only)
    #[serde(default)]
    pub single_attempt: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tier: default_stream_tier(),
            alert_trade_size: default_alert_trade_size(),
            single_attempt: false,
        }
    }
}

/// Session gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Treat the market as always open (testing/backfill only)
    #[serde(default)]
    pub force_open: bool,
}

/// Liveness HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Postgres storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; use `${DATABASE_URL}` in the YAML file
    pub url: String,
}

fn default_service_name() -> String {
    "marketsync".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_base_url() -> String {
    "https://api.polygon.io".to_string()
}

fn default_realtime_ws_url() -> String {
    "wss://socket.polygon.io/stocks".to_string()
}

fn default_delayed_ws_url() -> String {
    "wss://delayed.polygon.io/stocks".to_string()
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_sync_interval_secs() -> u64 {
    300
}

fn default_daily_lookback_days() -> i64 {
    60
}

fn default_minute_lookback_days() -> i64 {
    1
}

fn default_quote_ttl_ms() -> i64 {
    5000
}

fn default_stream_tier() -> String {
    "delayed".to_string()
}

fn default_alert_trade_size() -> f64 {
    10_000.0
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_applies_defaults() {
        let yaml = r#"
provider:
  api_key: test-key
"#;
        let cfg: CollectorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.provider.base_url, "https://api.polygon.io");
        assert_eq!(cfg.fetcher.rate_limit_ms, 1000);
        assert_eq!(cfg.fetcher.max_attempts, 3);
        assert_eq!(cfg.sync.daily_lookback_days, 60);
        assert_eq!(cfg.sync.quote_ttl_ms, 5000);
        assert_eq!(cfg.stream.tier, "delayed");
        assert!(!cfg.stream.single_attempt);
        assert!(!cfg.session.force_open);
        assert!(cfg.database.is_none());
    }

    #[test]
    fn test_full_yaml_overrides() {
        let yaml = r#"
service:
  name: collector-dev
  log_format: json
provider:
  api_key: k
  base_url: http://localhost:9999
sync:
  symbols: [aapl, MSFT]
  interval_secs: 60
stream:
  enabled: true
  tier: realtime
  alert_trade_size: 500
server:
  host: 127.0.0.1
  port: 9090
"#;
        let cfg: CollectorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.service.log_format, "json");
        assert_eq!(cfg.sync.symbols, vec!["aapl", "MSFT"]);
        assert!(cfg.stream.enabled);
        assert_eq!(cfg.stream.tier, "realtime");
        assert_eq!(cfg.server.port, 9090);
    }
}
