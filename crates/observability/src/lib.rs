//! Observability infrastructure for MarketSync
//!
//! This crate provides structured logging via tracing.
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("marketsync", LogFormat::Pretty)?;
//! tracing::info!("Collector started");
//! ```

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
