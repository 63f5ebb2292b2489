//! WebSocket streaming client for MarketSync
//!
//! Maintains a live trade and quote feed from the provider across
//! disconnects. The client authenticates, subscribes to every configured
//! symbol, and dispatches parsed events to sinks. A dropped connection
//! reconnects with doubling backoff; an authentication rejection on the
//! realtime feed downgrades the session to the delayed feed instead of
//! retrying the entitlement it does not have.
//!
//! # Modules
//!
//! - [`client`] - The connection state machine
//! - [`connector`] - Transport abstraction and the tungstenite-backed impl
//! - [`protocol`] - Wire frames in both directions
//! - [`sink`] - Where parsed events go
//! - [`backoff`] - Reconnect delay policy

pub mod backoff;
pub mod client;
pub mod connector;
pub mod error;
pub mod protocol;
pub mod sink;

pub use client::{StreamClient, StreamState, StreamStatus};
pub use connector::{Connection, Connector, WsConnector};
pub use error::StreamError;
pub use sink::{AlertSink, EventSink, LogAlertSink, StoreSink};
