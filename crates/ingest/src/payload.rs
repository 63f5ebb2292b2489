//! Provider response models.
//!
//! Snapshot payloads routinely omit quote, greek, and volume fields for
//! illiquid contracts, so everything that can be absent is an `Option`
//! and decoding never fails on a sparse row. Rows missing the fields a
//! contract cannot be keyed without are dropped by `into_contract`.

use chrono::NaiveDate;
use common::{Bar, OptionContract, OptionType, Symbol};
use serde::Deserialize;

/// Aggregate bars response (`/v2/aggs/ticker/...`)
#[derive(Debug, Deserialize)]
pub struct AggregatesResponse {
    #[serde(default)]
    pub results: Option<Vec<AggregateBar>>,
}

/// One aggregate bar row
#[derive(Debug, Deserialize)]
pub struct AggregateBar {
    /// Bar start, epoch milliseconds
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    #[serde(default)]
    pub v: Option<f64>,
}

impl AggregateBar {
    pub fn into_bar(self, symbol: &Symbol) -> Bar {
        Bar {
            symbol: symbol.clone(),
            ts: self.t,
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            volume: self.v.unwrap_or(0.0),
        }
    }
}

/// Universal snapshot response (`/v3/snapshot`)
#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    #[serde(default)]
    pub results: Option<Vec<SnapshotEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default)]
    pub session: Option<SnapshotSession>,
    /// Last update, epoch nanoseconds
    #[serde(default)]
    pub last_updated: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotSession {
    #[serde(default)]
    pub price: Option<f64>,
}

impl SnapshotEntry {
    /// Latest session price, if the snapshot carries one
    pub fn price(&self) -> Option<f64> {
        self.session.as_ref().and_then(|s| s.price)
    }

    /// Observation timestamp in epoch milliseconds
    pub fn ts_ms(&self) -> Option<i64> {
        self.last_updated.map(|ns| ns / 1_000_000)
    }
}

/// Option chain snapshot response (`/v3/snapshot/options/{underlying}`)
#[derive(Debug, Deserialize)]
pub struct ChainResponse {
    #[serde(default)]
    pub results: Option<Vec<ChainEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct ChainEntry {
    #[serde(default)]
    pub details: Option<ContractDetails>,
    #[serde(default)]
    pub last_quote: Option<ChainQuote>,
    #[serde(default)]
    pub greeks: Option<ChainGreeks>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
    #[serde(default)]
    pub day: Option<ChainDay>,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ContractDetails {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub strike_price: Option<f64>,
    #[serde(default)]
    pub contract_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChainQuote {
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChainGreeks {
    #[serde(default)]
    pub delta: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChainDay {
    #[serde(default)]
    pub volume: Option<f64>,
}

impl ChainEntry {
    /// Convert a chain row into a contract, or `None` when the row is
    /// missing its identity (ticker, expiration, strike, type).
    pub fn into_contract(self, underlying: &Symbol) -> Option<OptionContract> {
        let details = self.details?;
        let contract = details.ticker?;
        let expiration = details.expiration_date?;
        let strike = details.strike_price?;
        let option_type = match details.contract_type.as_deref() {
            Some("call") => OptionType::Call,
            Some("put") => OptionType::Put,
            _ => return None,
        };

        Some(OptionContract {
            underlying: underlying.clone(),
            contract,
            expiration,
            strike,
            option_type,
            bid: self.last_quote.as_ref().and_then(|q| q.bid),
            ask: self.last_quote.as_ref().and_then(|q| q.ask),
            implied_volatility: self.implied_volatility,
            delta: self.greeks.as_ref().and_then(|g| g.delta),
            volume: self.day.as_ref().and_then(|d| d.volume),
            open_interest: self.open_interest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_chain_row_decodes() {
        let entry: ChainEntry = serde_json::from_value(json!({
            "details": {
                "ticker": "O:SPY251219C00650000",
                "expiration_date": "2025-12-19",
                "strike_price": 650.0,
                "contract_type": "call"
            }
        }))
        .unwrap();

        let contract = entry.into_contract(&Symbol::new("SPY")).unwrap();
        assert_eq!(contract.contract, "O:SPY251219C00650000");
        assert_eq!(contract.bid, None);
        assert_eq!(contract.delta, None);
    }

    #[test]
    fn test_row_without_ticker_is_dropped() {
        let entry: ChainEntry = serde_json::from_value(json!({
            "details": {
                "expiration_date": "2025-12-19",
                "strike_price": 650.0,
                "contract_type": "call"
            },
            "open_interest": 42.0
        }))
        .unwrap();
        assert!(entry.into_contract(&Symbol::new("SPY")).is_none());
    }

    #[test]
    fn test_snapshot_ts_converts_ns_to_ms() {
        let entry: SnapshotEntry = serde_json::from_value(json!({
            "session": { "price": 212.5 },
            "last_updated": 1_700_000_000_123_000_000i64
        }))
        .unwrap();
        assert_eq!(entry.price(), Some(212.5));
        assert_eq!(entry.ts_ms(), Some(1_700_000_000_123));
    }

    #[test]
    fn test_aggregate_bar_defaults_missing_volume() {
        let bar: AggregateBar =
            serde_json::from_value(json!({"t": 1000, "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5}))
                .unwrap();
        let bar = bar.into_bar(&Symbol::new("AAPL"));
        assert_eq!(bar.volume, 0.0);
        assert_eq!(bar.ts, 1000);
    }
}
