//! Provider endpoint builders.
//!
//! Every endpoint is a GET with the API key passed as a query parameter;
//! the builders here produce the path and the non-credential parameters.

use chrono::NaiveDate;
use common::{Interval, Symbol};

/// Asset class an endpoint serves; decides which session calendar the
/// client consults when disambiguating a 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Market {
    #[default]
    Equity,
    Options,
}

/// A provider REST endpoint: path plus query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub params: Vec<(String, String)>,
    pub market: Market,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            market: Market::Equity,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn for_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }
}

/// Aggregate bars for a symbol over an inclusive date range
pub fn aggregates(symbol: &Symbol, interval: Interval, start: NaiveDate, end: NaiveDate) -> Endpoint {
    Endpoint::new(format!(
        "/v2/aggs/ticker/{}/range/1/{}/{}/{}",
        symbol,
        interval.timespan(),
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
    ))
    .with_param("adjusted", "true")
    .with_param("sort", "asc")
    .with_param("limit", "50000")
}

/// Universal snapshot for a single ticker (latest session price)
pub fn universal_snapshot(symbol: &Symbol) -> Endpoint {
    Endpoint::new("/v3/snapshot").with_param("ticker.any_of", symbol.as_str())
}

/// Option chain snapshot for an underlying, greeks included
pub fn option_chain(underlying: &Symbol) -> Endpoint {
    Endpoint::new(format!("/v3/snapshot/options/{}", underlying))
        .with_param("greeks", "true")
        .with_param("limit", "250")
        .for_market(Market::Options)
}

/// Exchange-reported market status (operator tooling)
pub fn market_status() -> Endpoint {
    Endpoint::new("/v1/marketstatus/now")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates_path() {
        let ep = aggregates(
            &Symbol::new("aapl"),
            Interval::Day,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        assert_eq!(ep.path, "/v2/aggs/ticker/AAPL/range/1/day/2025-01-02/2025-03-01");
        assert!(ep.params.contains(&("sort".to_string(), "asc".to_string())));
    }

    #[test]
    fn test_minute_aggregates_use_minute_timespan() {
        let ep = aggregates(
            &Symbol::new("SPY"),
            Interval::Minute,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
        );
        assert!(ep.path.contains("/range/1/minute/"));
    }

    #[test]
    fn test_option_chain_path() {
        let ep = option_chain(&Symbol::new("SPY"));
        assert_eq!(ep.path, "/v3/snapshot/options/SPY");
        assert!(ep.params.contains(&("greeks".to_string(), "true".to_string())));
        assert_eq!(ep.market, Market::Options);
    }

    #[test]
    fn test_endpoints_default_to_equity_market() {
        let ep = aggregates(
            &Symbol::new("AAPL"),
            Interval::Day,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
        );
        assert_eq!(ep.market, Market::Equity);
        assert_eq!(universal_snapshot(&Symbol::new("AAPL")).market, Market::Equity);
    }
}
