//! Streaming error types

use common::FeedTier;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// The provider rejected our credentials for this tier. Terminal on
    /// the delayed feed; on the realtime feed the client downgrades.
    #[error("authentication rejected on {tier} feed")]
    AuthRejected { tier: FeedTier },
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
