//! Common types used across MarketSync
//!
//! This module provides the fundamental domain types used throughout
//! the collector: symbols, bars, option contracts, and realtime quotes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ticker symbol (e.g., "AAPL", "SPY")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new Symbol, normalized to uppercase
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Get the symbol as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Bar aggregation interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// One bar per trading day
    Day,
    /// One bar per minute
    Minute,
}

impl Interval {
    /// Provider timespan string for aggregate requests
    pub fn timespan(&self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Minute => "minute",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.timespan())
    }
}

/// A single OHLCV bar.
///
/// Identified by `(symbol, ts)`; bars are upserted and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: Symbol,
    /// Bar timestamp in epoch milliseconds
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Option contract side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// A snapshot of one option contract within a chain.
///
/// Identified by `(underlying, contract)`. Market fields are optional
/// because snapshot rows frequently omit quotes and greeks for illiquid
/// contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying: Symbol,
    /// Full contract ticker (e.g., "O:SPY251219C00650000")
    pub contract: String,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub volume: Option<f64>,
    pub open_interest: Option<f64>,
}

/// A realtime price observation.
///
/// Identified by `(symbol, ts)` so concurrent symbols never overwrite
/// one another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeQuote {
    pub symbol: Symbol,
    /// Observation timestamp in epoch milliseconds
    pub ts: i64,
    pub price: f64,
}

/// Data feed entitlement tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedTier {
    /// Live feed, requires a realtime entitlement
    Realtime,
    /// 15-minute delayed feed
    Delayed,
}

impl std::fmt::Display for FeedTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedTier::Realtime => write!(f, "realtime"),
            FeedTier::Delayed => write!(f, "delayed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_uppercased() {
        let sym = Symbol::new("aapl");
        assert_eq!(sym.as_str(), "AAPL");
        assert_eq!(Symbol::from("msft"), Symbol::new("MSFT"));
    }

    #[test]
    fn test_interval_timespan() {
        assert_eq!(Interval::Day.timespan(), "day");
        assert_eq!(Interval::Minute.timespan(), "minute");
    }

    #[test]
    fn test_feed_tier_display() {
        assert_eq!(FeedTier::Realtime.to_string(), "realtime");
        assert_eq!(FeedTier::Delayed.to_string(), "delayed");
    }

    #[test]
    fn test_option_contract_serde_roundtrip() {
        let contract = OptionContract {
            underlying: Symbol::new("SPY"),
            contract: "O:SPY251219C00650000".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            strike: 650.0,
            option_type: OptionType::Call,
            bid: Some(1.25),
            ask: None,
            implied_volatility: Some(0.18),
            delta: None,
            volume: Some(120.0),
            open_interest: None,
        };

        let json = serde_json::to_string(&contract).unwrap();
        let back: OptionContract = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contract);
    }
}
