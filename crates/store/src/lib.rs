//! Market data storage for MarketSync
//!
//! The [`MarketStore`] trait is the seam between the synchronizer and
//! persistence. Two implementations ship here: an in-memory store for
//! tests and development, and a PostgreSQL store behind the `postgres`
//! feature.
//!
//! All writes are upserts on natural keys, so replaying a sync pass is
//! harmless.

pub mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use memory::InMemoryMarketStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresMarketStore;
pub use traits::{MarketStore, StoreResult};
