//! Wire frames in both directions.
//!
//! The provider batches events: every text frame is a JSON array, even
//! for a single event. Unrecognized event types decode to
//! [`WireEvent::Unknown`] so a feed schema addition never kills the
//! session.

use serde::{Deserialize, Serialize};

/// One inbound event, discriminated by the `ev` field
#[derive(Debug, Deserialize)]
#[serde(tag = "ev")]
pub enum WireEvent {
    /// Control-plane status (connect, auth, subscribe acknowledgments)
    #[serde(rename = "status")]
    Status {
        status: String,
        #[serde(default)]
        message: String,
    },

    /// Trade print
    #[serde(rename = "T")]
    Trade {
        #[serde(alias = "symbol")]
        sym: String,
        /// Price
        #[serde(alias = "price")]
        p: f64,
        /// Size
        #[serde(default, alias = "size")]
        s: Option<f64>,
        /// SIP timestamp, epoch milliseconds
        #[serde(alias = "timestamp")]
        t: i64,
    },

    /// NBBO quote. Delayed feeds sometimes omit one side of the book,
    /// so both prices are optional.
    #[serde(rename = "Q")]
    Quote {
        #[serde(alias = "symbol")]
        sym: String,
        /// Bid price
        #[serde(default)]
        bp: Option<f64>,
        /// Ask price
        #[serde(default)]
        ap: Option<f64>,
        /// SIP timestamp, epoch milliseconds
        #[serde(alias = "timestamp")]
        t: i64,
    },

    #[serde(other)]
    Unknown,
}

/// Outbound control frame (`auth` and `subscribe` share the shape)
#[derive(Debug, Serialize)]
struct ActionFrame<'a> {
    action: &'a str,
    params: &'a str,
}

/// Decode one text frame into its events.
///
/// Events are decoded element by element: a malformed event degrades to
/// [`WireEvent::Unknown`] instead of discarding the whole batch.
pub fn parse_frame(text: &str) -> Result<Vec<WireEvent>, serde_json::Error> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or(WireEvent::Unknown))
        .collect())
}

pub fn auth_frame(api_key: &str) -> String {
    frame("auth", api_key)
}

/// Subscribe frame covering every channel in one request
pub fn subscribe_frame(channels: &[String]) -> String {
    frame("subscribe", &channels.join(","))
}

fn frame(action: &str, params: &str) -> String {
    // Serializing two string fields cannot fail
    serde_json::to_string(&ActionFrame { action, params }).unwrap_or_default()
}

/// Trade and quote channels for one ticker
pub fn channels_for(symbol: &common::Symbol) -> [String; 2] {
    [format!("T.{}", symbol), format!("Q.{}", symbol)]
}
