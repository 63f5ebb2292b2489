//! The rate-limited fetch client.

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};
use session::SessionGate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::ResponseCache;
use crate::endpoints::{Endpoint, Market};
use crate::error::{FetchError, Result};

/// Rate-limited, cached HTTP client for the market-data provider.
///
/// Every request sleeps a fixed inter-request delay before hitting the
/// network, so burst behavior stays within the provider's per-minute
/// budget regardless of caller concurrency discipline. Responses are
/// cached by canonical URL (path plus sorted query) for the configured
/// TTL.
///
/// HTTP 429 is retried with `2^attempt` seconds of backoff up to the
/// configured attempt budget. HTTP 403 is ambiguous on free-tier keys:
/// outside market hours the provider rejects otherwise-valid requests,
/// so the client consults the session gate and converts the rejection
/// into an empty payload; during market hours it is a genuine
/// entitlement failure and surfaces as [`FetchError::Unauthorized`].
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    rate_limit: Duration,
    max_attempts: u32,
    cache: ResponseCache,
    gate: Arc<SessionGate>,
}

impl FetchClient {
    pub fn new(
        provider: &config::ProviderConfig,
        fetcher: &config::FetcherConfig,
        gate: Arc<SessionGate>,
    ) -> Result<Self> {
        let base_url = Url::parse(&provider.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", provider.base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetcher.request_timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key: provider.api_key.clone(),
            rate_limit: Duration::from_millis(fetcher.rate_limit_ms),
            max_attempts: fetcher.max_attempts.max(1),
            cache: ResponseCache::new(Duration::from_secs(fetcher.cache_ttl_secs)),
            gate,
        })
    }

    /// Fetch a provider endpoint as parsed JSON
    pub async fn get(&self, endpoint: &Endpoint) -> Result<Value> {
        self.request(&endpoint.path, &endpoint.params, endpoint.market)
            .await
    }

    /// Fetch `path` with the given query parameters as parsed JSON,
    /// gated on the equity calendar.
    ///
    /// A cache hit returns immediately without the rate-limit delay.
    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        self.request(path, params, Market::Equity).await
    }

    async fn request(
        &self,
        path: &str,
        params: &[(String, String)],
        market: Market,
    ) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))?;

        let mut query: Vec<(String, String)> = params.to_vec();
        query.push(("apiKey".to_string(), self.api_key.clone()));

        let cache_key = canonical_key(&url, &query);
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(%url, "cache hit");
            return Ok(cached);
        }

        for attempt in 0..self.max_attempts {
            // Pace every network request, retries included
            tokio::time::sleep(self.rate_limit).await;

            let response = self
                .http
                .get(url.clone())
                .query(&query)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        FetchError::Timeout
                    } else {
                        FetchError::Transport(e.to_string())
                    }
                })?;

            let status = response.status();
            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    // No point backing off when no attempt remains
                    if attempt + 1 < self.max_attempts {
                        let delay = backoff_delay(attempt);
                        warn!(%url, attempt, delay_secs = delay.as_secs(), "rate limited, backing off");
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
                StatusCode::FORBIDDEN => {
                    let now = Utc::now();
                    let open = match market {
                        Market::Equity => self.gate.is_equity_open(now),
                        Market::Options => self.gate.is_options_open(now),
                    };
                    return if open {
                        Err(FetchError::Unauthorized)
                    } else {
                        // Free-tier keys get 403 outside market hours even
                        // when valid; treat as "nothing to fetch right now".
                        info!(%url, "403 outside market hours, returning empty payload");
                        Ok(json!({}))
                    };
                }
                s if !s.is_success() => {
                    return Err(FetchError::Remote {
                        status: s.as_u16(),
                    });
                }
                _ => {}
            }

            let payload: Value = response
                .json()
                .await
                .map_err(|e| FetchError::Decode(e.to_string()))?;

            self.cache.insert(cache_key, payload.clone());
            return Ok(payload);
        }

        Err(FetchError::RateLimited {
            attempts: self.max_attempts,
        })
    }
}

/// Canonical cache key: URL path plus query parameters sorted by key.
///
/// Sorting makes the key independent of caller parameter order.
fn canonical_key(url: &Url, query: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = query.iter().collect();
    sorted.sort();
    let qs: Vec<String> = sorted.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", url, qs.join("&"))
}

/// Backoff delay for the nth rate-limit rejection: 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveTime, Weekday};
    use session::{SessionSchedule, TradingSession};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn closed_gate() -> Arc<SessionGate> {
        // No sessions at all, so the market is never open
        Arc::new(SessionGate::new(
            SessionSchedule::new(chrono_tz::UTC),
            SessionSchedule::new(chrono_tz::UTC),
        ))
    }

    fn open_gate() -> Arc<SessionGate> {
        Arc::new(SessionGate::us_equity(true))
    }

    fn all_day_schedule() -> SessionSchedule {
        SessionSchedule::new(chrono_tz::UTC).with_session(TradingSession::new(
            "AllDay",
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
        ))
    }

    /// Equities trading, options market closed
    fn options_closed_gate() -> Arc<SessionGate> {
        Arc::new(SessionGate::new(
            all_day_schedule(),
            SessionSchedule::new(chrono_tz::UTC),
        ))
    }

    fn client(base_url: &str, gate: Arc<SessionGate>, max_attempts: u32) -> FetchClient {
        let provider = config::ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            realtime_ws_url: "wss://example.invalid/rt".to_string(),
            delayed_ws_url: "wss://example.invalid/delayed".to_string(),
        };
        let fetcher = config::FetcherConfig {
            rate_limit_ms: 0,
            cache_ttl_secs: 300,
            max_attempts,
            request_timeout_secs: 5,
        };
        FetchClient::new(&provider, &fetcher, gate).unwrap()
    }

    #[test]
    fn test_canonical_key_is_order_independent() {
        let url = Url::parse("http://host/v3/snapshot").unwrap();
        let a = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        let b = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        assert_eq!(canonical_key(&url, &a), canonical_key(&url, &b));
    }

    #[test]
    fn test_backoff_delay_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        // Capped so a large attempt index cannot produce an hour-long sleep
        assert_eq!(backoff_delay(20), Duration::from_secs(64));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/thing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"n": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 3);
        let ep = Endpoint::new("/v1/thing");

        let first = client.get(&ep).await.unwrap();
        let second = client.get(&ep).await.unwrap();
        assert_eq!(first, second);
        // expect(1) verifies on drop that only one request hit the wire
    }

    #[tokio::test]
    async fn test_api_key_sent_as_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/thing"))
            .and(query_param("apiKey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 3);
        client.get(&Endpoint::new("/v1/thing")).await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/limited"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 2);
        let err = client.get(&Endpoint::new("/v1/limited")).await.unwrap_err();
        assert_matches!(err, FetchError::RateLimited { attempts: 2 });
    }

    #[tokio::test]
    async fn test_forbidden_while_closed_is_empty_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/thing"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 3);
        let payload = client.get(&Endpoint::new("/v1/thing")).await.unwrap();
        assert_eq!(payload, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_forbidden_while_open_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/thing"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client(&server.uri(), open_gate(), 3);
        let err = client.get(&Endpoint::new("/v1/thing")).await.unwrap_err();
        assert_matches!(err, FetchError::Unauthorized);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_without_final_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/limited"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 1);
        let started = std::time::Instant::now();
        let err = client.get(&Endpoint::new("/v1/limited")).await.unwrap_err();
        assert_matches!(err, FetchError::RateLimited { attempts: 1 });
        // The first backoff step is a full second; the last attempt must
        // not pay it
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_forbidden_option_request_consults_options_calendar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        // Equities trading, options closed: the chain request is treated
        // as "market closed", an equity request as a real rejection
        let client = client(&server.uri(), options_closed_gate(), 3);
        let chain = crate::endpoints::option_chain(&common::Symbol::new("SPY"));
        let payload = client.get(&chain).await.unwrap();
        assert_eq!(payload, serde_json::json!({}));

        let snapshot = crate::endpoints::universal_snapshot(&common::Symbol::new("SPY"));
        let err = client.get(&snapshot).await.unwrap_err();
        assert_matches!(err, FetchError::Unauthorized);
    }

    #[tokio::test]
    async fn test_server_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/broken"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 3);
        let err = client.get(&Endpoint::new("/v1/broken")).await.unwrap_err();
        assert_matches!(err, FetchError::Remote { status: 502 });
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = client(&server.uri(), closed_gate(), 3);
        let ep = Endpoint::new("/v1/flaky");
        assert!(client.get(&ep).await.is_err());
        let payload = client.get(&ep).await.unwrap();
        assert_eq!(payload, serde_json::json!({"ok": true}));
    }
}
