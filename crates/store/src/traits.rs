//! MarketStore trait definition

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Bar, Interval, OptionContract, RealtimeQuote, Symbol};

use crate::error::StoreError;

/// Result type for MarketStore operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// MarketStore trait - defines the interface for market data storage
///
/// This trait allows different storage implementations (in-memory,
/// PostgreSQL, etc.) to be swapped without changing the sync logic.
/// Every write is an upsert keyed by the row's natural key, so repeated
/// syncs of overlapping windows converge instead of duplicating.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Insert or replace bars, keyed by `(symbol, ts)`.
    ///
    /// Returns the number of rows written.
    async fn upsert_bars(&self, interval: Interval, bars: &[Bar]) -> StoreResult<u64>;

    /// Latest stored bar timestamp (epoch ms) for a symbol, if any
    async fn latest_bar_ts(&self, interval: Interval, symbol: &Symbol)
        -> StoreResult<Option<i64>>;

    /// Number of stored bars for a symbol
    async fn bar_count(&self, interval: Interval, symbol: &Symbol) -> StoreResult<u64>;

    /// Insert or replace option contracts, keyed by `(underlying, contract)`.
    ///
    /// Returns the number of rows written.
    async fn upsert_contracts(&self, contracts: &[OptionContract]) -> StoreResult<u64>;

    /// Whether any stored contract for the underlying expires on or
    /// after `as_of`. Used as the chain-level freshness gate.
    async fn has_unexpired_contracts(
        &self,
        underlying: &Symbol,
        as_of: NaiveDate,
    ) -> StoreResult<bool>;

    /// Insert or replace a realtime quote, keyed by `(symbol, ts)`
    async fn upsert_quote(&self, quote: &RealtimeQuote) -> StoreResult<()>;

    /// Most recent stored quote for a symbol, if any
    async fn latest_quote(&self, symbol: &Symbol) -> StoreResult<Option<RealtimeQuote>>;
}
