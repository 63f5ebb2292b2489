//! Rate-limited, cached HTTP fetch layer for MarketSync
//!
//! All provider REST traffic goes through [`FetchClient`], which
//! enforces a fixed inter-request delay, caches parsed responses by
//! canonical URL, retries rate-limit rejections with exponential
//! backoff, and disambiguates entitlement errors using the market
//! calendar.
//!
//! # Modules
//!
//! - [`client`] - The [`FetchClient`] itself
//! - [`cache`] - TTL-bounded response cache
//! - [`endpoints`] - Provider endpoint builders
//! - [`error`] - [`FetchError`] taxonomy

pub mod cache;
pub mod client;
pub mod endpoints;
pub mod error;

pub use client::FetchClient;
pub use endpoints::{Endpoint, Market};
pub use error::{FetchError, Result};
