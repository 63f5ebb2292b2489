//! Configuration validation
//!
//! Produces a [`ValidationReport`] of errors, warnings, and applied
//! defaults. Errors block startup; warnings do not.

use crate::substitution::has_unresolved_env_vars;
use crate::CollectorConfig;
use std::fmt;
use url::Url;

/// A single validation problem tied to a config field
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// A default value filled in for an omitted field
#[derive(Debug, Clone)]
pub struct AppliedDefault {
    pub field: String,
    pub value: String,
}

/// Result of validating a [`CollectorConfig`]
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub defaults_applied: Vec<AppliedDefault>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(field, message));
    }

    fn warn(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(field, message));
    }
}

/// Validate a loaded configuration
pub fn validate_config(config: &CollectorConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Provider credentials
    if config.provider.api_key.trim().is_empty() {
        report.error("provider.api_key", "API key must not be empty");
    } else if has_unresolved_env_vars(&config.provider.api_key) {
        report.error(
            "provider.api_key",
            format!(
                "unresolved environment variable: {}",
                config.provider.api_key
            ),
        );
    }

    // Provider endpoints
    match Url::parse(&config.provider.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => report.error(
            "provider.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        ),
        Err(e) => report.error("provider.base_url", format!("invalid URL: {}", e)),
    }
    for (field, value) in [
        ("provider.realtime_ws_url", &config.provider.realtime_ws_url),
        ("provider.delayed_ws_url", &config.provider.delayed_ws_url),
    ] {
        match Url::parse(value) {
            Ok(url) if url.scheme() == "ws" || url.scheme() == "wss" => {}
            Ok(url) => report.warn(field, format!("expected ws/wss scheme, got '{}'", url.scheme())),
            Err(e) => report.error(field, format!("invalid URL: {}", e)),
        }
    }

    // Fetcher tuning
    if config.fetcher.max_attempts == 0 {
        report.error("fetcher.max_attempts", "must be at least 1");
    }
    if config.fetcher.request_timeout_secs == 0 {
        report.error("fetcher.request_timeout_secs", "must be at least 1");
    }
    if config.fetcher.rate_limit_ms == 0 {
        report.warn(
            "fetcher.rate_limit_ms",
            "rate limiting disabled; upstream may throttle aggressively",
        );
    }

    // Sync
    if config.sync.symbols.is_empty() {
        report.warn("sync.symbols", "no symbols configured; sync passes will be empty");
    }
    if config.sync.interval_secs == 0 {
        report.error("sync.interval_secs", "must be at least 1");
    }
    if config.sync.daily_lookback_days <= 0 {
        report.error("sync.daily_lookback_days", "must be positive");
    }
    if config.sync.minute_lookback_days <= 0 {
        report.error("sync.minute_lookback_days", "must be positive");
    }
    if config.sync.quote_ttl_ms < 0 {
        report.error("sync.quote_ttl_ms", "must not be negative");
    }

    // Stream
    match config.stream.tier.as_str() {
        "realtime" | "delayed" => {}
        other => report.error(
            "stream.tier",
            format!("expected 'realtime' or 'delayed', got '{}'", other),
        ),
    }
    if config.stream.alert_trade_size <= 0.0 {
        report.warn(
            "stream.alert_trade_size",
            "non-positive threshold; every trade will alert",
        );
    }

    // Session
    if config.session.force_open {
        report.warn(
            "session.force_open",
            "market hours are bypassed; do not enable in production",
        );
    }

    // Logging
    if !matches!(
        config.service.log_format.as_str(),
        "pretty" | "json" | "compact"
    ) {
        report.error(
            "service.log_format",
            format!("unknown log format '{}'", config.service.log_format),
        );
    }

    // Database
    if let Some(db) = &config.database {
        if has_unresolved_env_vars(&db.url) {
            report.error(
                "database.url",
                "unresolved environment variable in connection string",
            );
        }
    }

    report
}
