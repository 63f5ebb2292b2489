//! Fetch error taxonomy

use thiserror::Error;

/// Result type alias for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors surfaced by the fetch layer.
///
/// `Transport` and `Timeout` are the retryable class; callers that want
/// another attempt schedule one themselves. `Unauthorized` is fatal and
/// must never be retried.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("unauthorized: API key rejected while the market is open")]
    Unauthorized,

    #[error("remote error: HTTP {status}")]
    Remote { status: u16 },

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether a caller may reasonably retry the request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::Timeout | FetchError::RateLimited { .. }
        )
    }
}
