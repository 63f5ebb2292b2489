//! Incremental market data synchronizer for MarketSync
//!
//! The [`Synchronizer`] keeps the local store converged with the
//! provider: daily and minute bars advance incrementally from the last
//! stored timestamp, option chains refresh only once the stored chain
//! has fully expired, and realtime quotes refresh only once the latest
//! stored observation goes stale. Every write is an idempotent upsert,
//! so overlapping windows and repeated passes are safe.
//!
//! # Modules
//!
//! - [`synchronizer`] - The sync operations and pass runner
//! - [`payload`] - Provider response models (tolerant of missing fields)
//! - [`error`] - [`IngestError`]

pub mod error;
pub mod payload;
pub mod synchronizer;

pub use error::IngestError;
pub use synchronizer::{PassSummary, SyncOutcome, Synchronizer};
