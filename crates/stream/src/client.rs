//! The streaming connection state machine.
//!
//! One session is connect, authenticate, subscribe, then dispatch events
//! until the transport drops. Across sessions the client reconnects with
//! doubling backoff, and an entitlement rejection on the realtime feed
//! downgrades the client to the delayed feed rather than retrying a
//! credential the provider has already refused. A rejection on the
//! delayed feed is terminal.

use common::{FeedTier, RealtimeQuote, Symbol};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::connector::{Connection, Connector};
use crate::error::StreamError;
use crate::protocol::{self, WireEvent};
use crate::sink::{AlertSink, EventSink};

/// Where the client currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    AwaitingAuth,
    Subscribed,
    Reconnecting,
    /// Realtime entitlement rejected; switching to the delayed feed
    Downgrading,
    /// Terminal: the delayed feed also rejected our credentials
    Stopped,
}

/// Observable client status, published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStatus {
    pub state: StreamState,
    pub tier: FeedTier,
}

enum SessionEnd {
    Cancelled,
    AuthRejected,
    Transport(String),
}

pub struct StreamClient {
    connector: Box<dyn Connector>,
    events: Arc<dyn EventSink>,
    alerts: Arc<dyn AlertSink>,
    api_key: String,
    realtime_url: String,
    delayed_url: String,
    channels: Vec<String>,
    tier: FeedTier,
    alert_trade_size: f64,
    single_attempt: bool,
    status_tx: watch::Sender<StreamStatus>,
    backoff: Backoff,
}

impl StreamClient {
    pub fn new(
        connector: Box<dyn Connector>,
        events: Arc<dyn EventSink>,
        alerts: Arc<dyn AlertSink>,
        provider: &config::ProviderConfig,
        stream: &config::StreamConfig,
        symbols: &[Symbol],
    ) -> Self {
        let tier = if stream.tier == "realtime" {
            FeedTier::Realtime
        } else {
            FeedTier::Delayed
        };
        let channels = symbols.iter().flat_map(protocol::channels_for).collect();
        let (status_tx, _) = watch::channel(StreamStatus {
            state: StreamState::Disconnected,
            tier,
        });
        Self {
            connector,
            events,
            alerts,
            api_key: provider.api_key.clone(),
            realtime_url: provider.realtime_ws_url.clone(),
            delayed_url: provider.delayed_ws_url.clone(),
            channels,
            tier,
            alert_trade_size: stream.alert_trade_size,
            single_attempt: stream.single_attempt,
            status_tx,
            backoff: Backoff::default(),
        }
    }

    /// Watch state transitions; the current status is always readable
    pub fn subscribe(&self) -> watch::Receiver<StreamStatus> {
        self.status_tx.subscribe()
    }

    fn set_state(&self, state: StreamState) {
        self.status_tx.send_replace(StreamStatus {
            state,
            tier: self.tier,
        });
    }

    /// Run until cancelled or terminally rejected
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), StreamError> {
        loop {
            if shutdown.is_cancelled() {
                self.set_state(StreamState::Disconnected);
                return Ok(());
            }
            self.set_state(StreamState::Connecting);
            let url = match self.tier {
                FeedTier::Realtime => self.realtime_url.clone(),
                FeedTier::Delayed => self.delayed_url.clone(),
            };
            let connected = tokio::select! {
                _ = shutdown.cancelled() => {
                    self.set_state(StreamState::Disconnected);
                    return Ok(());
                }
                result = self.connector.connect(&url) => result,
            };
            let conn = match connected {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(url, error = %e, "stream connect failed");
                    if self.single_attempt {
                        self.set_state(StreamState::Disconnected);
                        return Ok(());
                    }
                    self.set_state(StreamState::Reconnecting);
                    if !self.wait_backoff(&shutdown).await {
                        return Ok(());
                    }
                    continue;
                }
            };

            match self.session(conn, &shutdown).await {
                SessionEnd::Cancelled => {
                    self.set_state(StreamState::Disconnected);
                    return Ok(());
                }
                SessionEnd::AuthRejected => match self.tier {
                    FeedTier::Realtime => {
                        warn!("realtime entitlement rejected, switching to delayed feed");
                        self.set_state(StreamState::Downgrading);
                        self.tier = FeedTier::Delayed;
                        self.backoff.reset();
                    }
                    FeedTier::Delayed => {
                        error!("delayed feed rejected credentials, stopping stream");
                        self.set_state(StreamState::Stopped);
                        return Err(StreamError::AuthRejected {
                            tier: FeedTier::Delayed,
                        });
                    }
                },
                SessionEnd::Transport(reason) => {
                    warn!(reason, "stream connection lost");
                    if self.single_attempt {
                        self.set_state(StreamState::Disconnected);
                        return Ok(());
                    }
                    self.set_state(StreamState::Reconnecting);
                    if !self.wait_backoff(&shutdown).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Sleep out the backoff delay; false means shutdown arrived first
    async fn wait_backoff(&mut self, shutdown: &CancellationToken) -> bool {
        let delay = self.backoff.next_delay();
        debug!(delay_secs = delay.as_secs(), "waiting before reconnect");
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    async fn session(
        &mut self,
        mut conn: Box<dyn Connection>,
        shutdown: &CancellationToken,
    ) -> SessionEnd {
        if let Err(e) = conn.send(&protocol::auth_frame(&self.api_key)).await {
            return SessionEnd::Transport(e.to_string());
        }
        self.set_state(StreamState::AwaitingAuth);

        loop {
            let frame = tokio::select! {
                _ = shutdown.cancelled() => {
                    conn.close().await;
                    return SessionEnd::Cancelled;
                }
                frame = conn.recv() => frame,
            };
            let text = match frame {
                Ok(Some(text)) => text,
                Ok(None) => return SessionEnd::Transport("connection closed by peer".to_string()),
                Err(e) => return SessionEnd::Transport(e.to_string()),
            };
            let events = match protocol::parse_frame(&text) {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "unparseable frame, skipping");
                    continue;
                }
            };
            for event in events {
                match event {
                    WireEvent::Status { status, message } => match status.as_str() {
                        "auth_success" => {
                            if let Err(e) =
                                conn.send(&protocol::subscribe_frame(&self.channels)).await
                            {
                                return SessionEnd::Transport(e.to_string());
                            }
                            self.set_state(StreamState::Subscribed);
                            self.backoff.reset();
                            info!(
                                tier = %self.tier,
                                channels = self.channels.len(),
                                "stream subscribed"
                            );
                        }
                        // The provider signals rejection as an "error"
                        // status with this message; some gateways say
                        // "auth_failed" instead.
                        "error" if message == "not authorized" => {
                            conn.close().await;
                            return SessionEnd::AuthRejected;
                        }
                        "auth_failed" => {
                            conn.close().await;
                            return SessionEnd::AuthRejected;
                        }
                        _ => debug!(status, message, "stream status"),
                    },
                    WireEvent::Trade { sym, p, s, t } => {
                        self.dispatch(&sym, t, p).await;
                        if let Some(size) = s {
                            if size >= self.alert_trade_size {
                                self.alerts.large_trade(&sym, p, size);
                            }
                        }
                    }
                    WireEvent::Quote { sym, bp, ap, t } => match (bp, ap) {
                        (Some(bp), Some(ap)) => self.dispatch(&sym, t, (bp + ap) / 2.0).await,
                        // No midpoint without both sides of the book
                        _ => debug!(symbol = %sym, "one-sided quote, skipping"),
                    },
                    WireEvent::Unknown => {}
                }
            }
        }
    }

    async fn dispatch(&self, sym: &str, ts: i64, price: f64) {
        let quote = RealtimeQuote {
            symbol: Symbol::new(sym),
            ts,
            price,
        };
        if let Err(e) = self.events.record(&quote).await {
            warn!(symbol = sym, error = %e, "failed to record stream quote");
        }
    }
}
