//! PostgreSQL market store implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Bar, Interval, OptionContract, RealtimeQuote, Symbol};
use sqlx::postgres::PgPool;
use sqlx::Row;
use std::sync::Arc;

use crate::error::StoreError;
use crate::traits::{MarketStore, StoreResult};

/// PostgreSQL market store
pub struct PostgresMarketStore {
    pool: Arc<PgPool>,
}

impl PostgresMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to the database and create the schema if needed
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables if they do not exist
    pub async fn init_schema(&self) -> StoreResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS bars_day (
                symbol TEXT NOT NULL,
                ts BIGINT NOT NULL,
                open DOUBLE PRECISION NOT NULL,
                high DOUBLE PRECISION NOT NULL,
                low DOUBLE PRECISION NOT NULL,
                close DOUBLE PRECISION NOT NULL,
                volume DOUBLE PRECISION NOT NULL,
                PRIMARY KEY (symbol, ts)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS bars_minute (
                symbol TEXT NOT NULL,
                ts BIGINT NOT NULL,
                open DOUBLE PRECISION NOT NULL,
                high DOUBLE PRECISION NOT NULL,
                low DOUBLE PRECISION NOT NULL,
                close DOUBLE PRECISION NOT NULL,
                volume DOUBLE PRECISION NOT NULL,
                PRIMARY KEY (symbol, ts)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS option_contracts (
                underlying TEXT NOT NULL,
                contract TEXT NOT NULL,
                expiration DATE NOT NULL,
                strike DOUBLE PRECISION NOT NULL,
                option_type TEXT NOT NULL,
                bid DOUBLE PRECISION,
                ask DOUBLE PRECISION,
                implied_volatility DOUBLE PRECISION,
                delta DOUBLE PRECISION,
                volume DOUBLE PRECISION,
                open_interest DOUBLE PRECISION,
                PRIMARY KEY (underlying, contract)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS realtime_quotes (
                symbol TEXT NOT NULL,
                ts BIGINT NOT NULL,
                price DOUBLE PRECISION NOT NULL,
                PRIMARY KEY (symbol, ts)
            )
            "#,
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&*self.pool)
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn bars_table(interval: Interval) -> &'static str {
        match interval {
            Interval::Day => "bars_day",
            Interval::Minute => "bars_minute",
        }
    }
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
    async fn upsert_bars(&self, interval: Interval, bars: &[Bar]) -> StoreResult<u64> {
        let table = Self::bars_table(interval);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        for bar in bars {
            sqlx::query(&format!(
                r#"
                INSERT INTO {} (symbol, ts, open, high, low, close, volume)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (symbol, ts) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    volume = EXCLUDED.volume
                "#,
                table
            ))
            .bind(bar.symbol.as_str())
            .bind(bar.ts)
            .bind(bar.open)
            .bind(bar.high)
            .bind(bar.low)
            .bind(bar.close)
            .bind(bar.volume)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(bars.len() as u64)
    }

    async fn latest_bar_ts(
        &self,
        interval: Interval,
        symbol: &Symbol,
    ) -> StoreResult<Option<i64>> {
        let table = Self::bars_table(interval);
        let row = sqlx::query(&format!("SELECT MAX(ts) AS ts FROM {} WHERE symbol = $1", table))
            .bind(symbol.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(row.get::<Option<i64>, _>("ts"))
    }

    async fn bar_count(&self, interval: Interval, symbol: &Symbol) -> StoreResult<u64> {
        let table = Self::bars_table(interval);
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS n FROM {} WHERE symbol = $1",
            table
        ))
        .bind(symbol.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn upsert_contracts(&self, contracts: &[OptionContract]) -> StoreResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        for contract in contracts {
            sqlx::query(
                r#"
                INSERT INTO option_contracts (
                    underlying, contract, expiration, strike, option_type,
                    bid, ask, implied_volatility, delta, volume, open_interest
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (underlying, contract) DO UPDATE SET
                    expiration = EXCLUDED.expiration,
                    strike = EXCLUDED.strike,
                    option_type = EXCLUDED.option_type,
                    bid = EXCLUDED.bid,
                    ask = EXCLUDED.ask,
                    implied_volatility = EXCLUDED.implied_volatility,
                    delta = EXCLUDED.delta,
                    volume = EXCLUDED.volume,
                    open_interest = EXCLUDED.open_interest
                "#,
            )
            .bind(contract.underlying.as_str())
            .bind(&contract.contract)
            .bind(contract.expiration)
            .bind(contract.strike)
            .bind(contract.option_type.to_string())
            .bind(contract.bid)
            .bind(contract.ask)
            .bind(contract.implied_volatility)
            .bind(contract.delta)
            .bind(contract.volume)
            .bind(contract.open_interest)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(contracts.len() as u64)
    }

    async fn has_unexpired_contracts(
        &self,
        underlying: &Symbol,
        as_of: NaiveDate,
    ) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM option_contracts WHERE underlying = $1 AND expiration >= $2",
        )
        .bind(underlying.as_str())
        .bind(as_of)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn upsert_quote(&self, quote: &RealtimeQuote) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO realtime_quotes (symbol, ts, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (symbol, ts) DO UPDATE SET price = EXCLUDED.price
            "#,
        )
        .bind(quote.symbol.as_str())
        .bind(quote.ts)
        .bind(quote.price)
        .execute(&*self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn latest_quote(&self, symbol: &Symbol) -> StoreResult<Option<RealtimeQuote>> {
        let row = sqlx::query(
            "SELECT symbol, ts, price FROM realtime_quotes WHERE symbol = $1 ORDER BY ts DESC LIMIT 1",
        )
        .bind(symbol.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(row.map(|row| RealtimeQuote {
            symbol: Symbol::new(row.get::<String, _>("symbol")),
            ts: row.get("ts"),
            price: row.get("price"),
        }))
    }
}
