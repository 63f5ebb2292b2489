//! In-memory market store implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Bar, Interval, OptionContract, RealtimeQuote, Symbol};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::traits::{MarketStore, StoreResult};

/// In-memory market store for testing and development
#[derive(Default)]
pub struct InMemoryMarketStore {
    bars: RwLock<HashMap<Interval, HashMap<(String, i64), Bar>>>,
    contracts: RwLock<HashMap<(String, String), OptionContract>>,
    // BTreeMap keyed by ts makes latest-quote a last_key_value lookup
    quotes: RwLock<HashMap<String, BTreeMap<i64, RealtimeQuote>>>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn upsert_bars(&self, interval: Interval, bars: &[Bar]) -> StoreResult<u64> {
        let mut store = self.bars.write();
        let table = store.entry(interval).or_default();
        for bar in bars {
            table.insert((bar.symbol.as_str().to_string(), bar.ts), bar.clone());
        }
        Ok(bars.len() as u64)
    }

    async fn latest_bar_ts(
        &self,
        interval: Interval,
        symbol: &Symbol,
    ) -> StoreResult<Option<i64>> {
        let store = self.bars.read();
        Ok(store.get(&interval).and_then(|table| {
            table
                .keys()
                .filter(|(sym, _)| sym == symbol.as_str())
                .map(|(_, ts)| *ts)
                .max()
        }))
    }

    async fn bar_count(&self, interval: Interval, symbol: &Symbol) -> StoreResult<u64> {
        let store = self.bars.read();
        Ok(store
            .get(&interval)
            .map(|table| {
                table
                    .keys()
                    .filter(|(sym, _)| sym == symbol.as_str())
                    .count() as u64
            })
            .unwrap_or(0))
    }

    async fn upsert_contracts(&self, contracts: &[OptionContract]) -> StoreResult<u64> {
        let mut store = self.contracts.write();
        for contract in contracts {
            store.insert(
                (
                    contract.underlying.as_str().to_string(),
                    contract.contract.clone(),
                ),
                contract.clone(),
            );
        }
        Ok(contracts.len() as u64)
    }

    async fn has_unexpired_contracts(
        &self,
        underlying: &Symbol,
        as_of: NaiveDate,
    ) -> StoreResult<bool> {
        let store = self.contracts.read();
        Ok(store.iter().any(|((under, _), contract)| {
            under == underlying.as_str() && contract.expiration >= as_of
        }))
    }

    async fn upsert_quote(&self, quote: &RealtimeQuote) -> StoreResult<()> {
        let mut store = self.quotes.write();
        store
            .entry(quote.symbol.as_str().to_string())
            .or_default()
            .insert(quote.ts, quote.clone());
        Ok(())
    }

    async fn latest_quote(&self, symbol: &Symbol) -> StoreResult<Option<RealtimeQuote>> {
        let store = self.quotes.read();
        Ok(store
            .get(symbol.as_str())
            .and_then(|by_ts| by_ts.last_key_value().map(|(_, q)| q.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(symbol: &str, ts: i64, close: f64) -> Bar {
        Bar {
            symbol: Symbol::new(symbol),
            ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
        }
    }

    fn contract(underlying: &str, ticker: &str, expiration: NaiveDate) -> OptionContract {
        OptionContract {
            underlying: Symbol::new(underlying),
            contract: ticker.to_string(),
            expiration,
            strike: 100.0,
            option_type: common::OptionType::Call,
            bid: None,
            ask: None,
            implied_volatility: None,
            delta: None,
            volume: None,
            open_interest: None,
        }
    }

    #[tokio::test]
    async fn test_bar_upsert_is_idempotent() {
        let store = InMemoryMarketStore::new();
        let sym = Symbol::new("AAPL");
        let bars = vec![bar("AAPL", 1000, 10.0), bar("AAPL", 2000, 11.0)];

        store.upsert_bars(Interval::Day, &bars).await.unwrap();
        store.upsert_bars(Interval::Day, &bars).await.unwrap();

        assert_eq!(store.bar_count(Interval::Day, &sym).await.unwrap(), 2);
        assert_eq!(
            store.latest_bar_ts(Interval::Day, &sym).await.unwrap(),
            Some(2000)
        );
    }

    #[tokio::test]
    async fn test_intervals_are_separate_tables() {
        let store = InMemoryMarketStore::new();
        let sym = Symbol::new("AAPL");
        store
            .upsert_bars(Interval::Day, &[bar("AAPL", 1000, 10.0)])
            .await
            .unwrap();

        assert_eq!(store.bar_count(Interval::Minute, &sym).await.unwrap(), 0);
        assert_eq!(
            store.latest_bar_ts(Interval::Minute, &sym).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_unexpired_contract_gate() {
        let store = InMemoryMarketStore::new();
        let spy = Symbol::new("SPY");
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        store
            .upsert_contracts(&[contract(
                "SPY",
                "O:SPY250101C00100000",
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )])
            .await
            .unwrap();
        assert!(!store.has_unexpired_contracts(&spy, today).await.unwrap());

        store
            .upsert_contracts(&[contract(
                "SPY",
                "O:SPY251219C00650000",
                NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            )])
            .await
            .unwrap();
        assert!(store.has_unexpired_contracts(&spy, today).await.unwrap());
        // An expiring-today contract still counts as fresh
        assert!(store
            .has_unexpired_contracts(&spy, NaiveDate::from_ymd_opt(2025, 12, 19).unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_latest_quote_per_symbol() {
        let store = InMemoryMarketStore::new();
        let aapl = Symbol::new("AAPL");
        let msft = Symbol::new("MSFT");

        for (sym, ts, price) in [("AAPL", 100, 10.0), ("MSFT", 300, 30.0), ("AAPL", 200, 11.0)] {
            store
                .upsert_quote(&RealtimeQuote {
                    symbol: Symbol::new(sym),
                    ts,
                    price,
                })
                .await
                .unwrap();
        }

        // Symbols never clobber each other even with interleaved writes
        let latest = store.latest_quote(&aapl).await.unwrap().unwrap();
        assert_eq!((latest.ts, latest.price), (200, 11.0));
        let latest = store.latest_quote(&msft).await.unwrap().unwrap();
        assert_eq!((latest.ts, latest.price), (300, 30.0));
    }
}
