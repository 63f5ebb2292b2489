//! Ingest error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] fetcher::FetchError),

    #[error(transparent)]
    Store(#[from] store::StoreError),

    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}
