//! Where parsed stream events go.

use async_trait::async_trait;
use common::RealtimeQuote;
use std::sync::Arc;
use store::{MarketStore, StoreError};
use tracing::warn;

/// Receives every price observation from the stream
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, quote: &RealtimeQuote) -> Result<(), StoreError>;
}

/// Receives notable trades (size at or above the configured threshold)
pub trait AlertSink: Send + Sync {
    fn large_trade(&self, symbol: &str, price: f64, size: f64);
}

/// Writes observations into the market store. Trades land at the trade
/// price; quotes land at the bid/ask midpoint.
pub struct StoreSink {
    store: Arc<dyn MarketStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventSink for StoreSink {
    async fn record(&self, quote: &RealtimeQuote) -> Result<(), StoreError> {
        self.store.upsert_quote(quote).await
    }
}

/// Surfaces large trades in the service log
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn large_trade(&self, symbol: &str, price: f64, size: f64) {
        warn!(symbol, price, size, "large trade");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Symbol;
    use store::InMemoryMarketStore;

    #[tokio::test]
    async fn test_store_sink_writes_quote() {
        let store = Arc::new(InMemoryMarketStore::new());
        let sink = StoreSink::new(store.clone());

        sink.record(&RealtimeQuote {
            symbol: Symbol::new("AAPL"),
            ts: 1_700_000_000_000,
            price: 212.5,
        })
        .await
        .unwrap();

        let latest = store
            .latest_quote(&Symbol::new("AAPL"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.price, 212.5);
    }
}
