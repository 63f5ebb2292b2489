//! Sync operations and the scheduled pass runner.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{Interval, Symbol};
use fetcher::{endpoints, FetchClient};
use session::SessionGate;
use std::sync::Arc;
use store::MarketStore;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::payload::{AggregatesResponse, ChainResponse, SnapshotResponse};

/// What a single sync operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Rows were fetched and upserted
    Synced { rows: u64 },
    /// Stored data is already current; nothing was fetched
    Fresh,
    /// The market for this asset class is closed; nothing was fetched
    SessionClosed,
    /// The provider returned an empty or unusable payload
    NoData,
}

/// Result of one scheduled pass over the symbol universe
#[derive(Debug, Default)]
pub struct PassSummary {
    pub synced: usize,
    pub failed: usize,
}

/// Keeps the local store converged with the provider.
///
/// Each operation is independently idempotent; a pass may be interrupted
/// and rerun without cleanup.
pub struct Synchronizer {
    fetcher: Arc<FetchClient>,
    store: Arc<dyn MarketStore>,
    gate: Arc<SessionGate>,
    config: config::SyncConfig,
}

impl Synchronizer {
    pub fn new(
        fetcher: Arc<FetchClient>,
        store: Arc<dyn MarketStore>,
        gate: Arc<SessionGate>,
        config: config::SyncConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            gate,
            config,
        }
    }

    fn lookback_days(&self, interval: Interval) -> i64 {
        match interval {
            Interval::Day => self.config.daily_lookback_days,
            Interval::Minute => self.config.minute_lookback_days,
        }
    }

    /// Advance stored bars for a symbol up to today.
    ///
    /// The window starts the day after the latest stored bar, or the
    /// configured lookback for a symbol seen for the first time. A
    /// store already at today's bar is a no-op.
    pub async fn sync_bars(
        &self,
        symbol: &Symbol,
        interval: Interval,
    ) -> Result<SyncOutcome, IngestError> {
        let now = Utc::now();
        if !self.gate.is_equity_open(now) {
            debug!(%symbol, %interval, "equity market closed, skipping bar sync");
            return Ok(SyncOutcome::SessionClosed);
        }

        let today = now.date_naive();
        let start = match self.store.latest_bar_ts(interval, symbol).await? {
            Some(ts) => ms_to_date(ts) + Duration::days(1),
            None => today - Duration::days(self.lookback_days(interval)),
        };
        if start > today {
            debug!(%symbol, %interval, "bars already current");
            return Ok(SyncOutcome::Fresh);
        }

        let endpoint = endpoints::aggregates(symbol, interval, start, today);
        let payload = self.fetcher.get(&endpoint).await?;
        let response: AggregatesResponse = serde_json::from_value(payload)?;

        let bars: Vec<_> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_bar(symbol))
            .collect();
        if bars.is_empty() {
            debug!(%symbol, %interval, %start, "no bars returned for window");
            return Ok(SyncOutcome::NoData);
        }

        let rows = self.store.upsert_bars(interval, &bars).await?;
        info!(%symbol, %interval, rows, %start, %today, "bars synced");
        Ok(SyncOutcome::Synced { rows })
    }

    /// Refresh the option chain for an underlying.
    ///
    /// Skipped while any stored contract is still unexpired; a chain is
    /// refreshed as a whole, never contract by contract. Rows missing
    /// their identity fields are dropped, not fatal.
    pub async fn sync_option_chain(&self, underlying: &Symbol) -> Result<SyncOutcome, IngestError> {
        let now = Utc::now();
        if !self.gate.is_options_open(now) {
            debug!(%underlying, "options market closed, skipping chain sync");
            return Ok(SyncOutcome::SessionClosed);
        }

        let today = now.date_naive();
        if self.store.has_unexpired_contracts(underlying, today).await? {
            debug!(%underlying, "stored chain still unexpired");
            return Ok(SyncOutcome::Fresh);
        }

        let payload = self.fetcher.get(&endpoints::option_chain(underlying)).await?;
        let response: ChainResponse = serde_json::from_value(payload)?;

        let rows = response.results.unwrap_or_default();
        let total = rows.len();
        let contracts: Vec<_> = rows
            .into_iter()
            .filter_map(|row| row.into_contract(underlying))
            .collect();
        if contracts.len() < total {
            warn!(
                %underlying,
                dropped = total - contracts.len(),
                "chain rows missing identity fields"
            );
        }
        if contracts.is_empty() {
            return Ok(SyncOutcome::NoData);
        }

        let rows = self.store.upsert_contracts(&contracts).await?;
        info!(%underlying, rows, "option chain synced");
        Ok(SyncOutcome::Synced { rows })
    }

    /// Refresh the realtime quote for a symbol.
    ///
    /// The staleness check runs unconditionally and is itself the gate;
    /// quotes are not session-gated because the snapshot endpoint serves
    /// the last session's price after hours. A payload without a price
    /// is a silent no-op.
    pub async fn sync_realtime_quote(&self, symbol: &Symbol) -> Result<SyncOutcome, IngestError> {
        let now_ms = Utc::now().timestamp_millis();
        if let Some(latest) = self.store.latest_quote(symbol).await? {
            if now_ms - latest.ts < self.config.quote_ttl_ms {
                debug!(%symbol, age_ms = now_ms - latest.ts, "quote still fresh");
                return Ok(SyncOutcome::Fresh);
            }
        }

        let payload = self
            .fetcher
            .get(&endpoints::universal_snapshot(symbol))
            .await?;
        let response: SnapshotResponse = serde_json::from_value(payload)?;

        let entry = match response.results.unwrap_or_default().into_iter().next() {
            Some(entry) => entry,
            None => return Ok(SyncOutcome::NoData),
        };
        let price = match entry.price() {
            Some(price) => price,
            None => {
                debug!(%symbol, "snapshot carried no price");
                return Ok(SyncOutcome::NoData);
            }
        };
        let ts = entry.ts_ms().unwrap_or(now_ms);

        self.store
            .upsert_quote(&common::RealtimeQuote {
                symbol: symbol.clone(),
                ts,
                price,
            })
            .await?;
        debug!(%symbol, price, ts, "quote synced");
        Ok(SyncOutcome::Synced { rows: 1 })
    }

    /// Run every sync operation for one symbol
    async fn sync_symbol(&self, symbol: &Symbol) -> Result<(), IngestError> {
        self.sync_bars(symbol, Interval::Day).await?;
        self.sync_bars(symbol, Interval::Minute).await?;
        self.sync_option_chain(symbol).await?;
        self.sync_realtime_quote(symbol).await?;
        Ok(())
    }

    /// Run a full pass over the symbol universe.
    ///
    /// One symbol failing never aborts the pass for the rest.
    pub async fn run_pass(&self, symbols: &[Symbol]) -> PassSummary {
        let mut summary = PassSummary::default();
        for symbol in symbols {
            match self.sync_symbol(symbol).await {
                Ok(()) => summary.synced += 1,
                Err(e) => {
                    warn!(%symbol, error = %e, "symbol sync failed, continuing pass");
                    summary.failed += 1;
                }
            }
        }
        info!(
            synced = summary.synced,
            failed = summary.failed,
            "sync pass complete"
        );
        summary
    }
}

/// Date (UTC) of an epoch-millisecond timestamp
fn ms_to_date(ts: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|| Utc::now().date_naive())
}
