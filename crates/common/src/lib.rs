//! Common types and utilities for MarketSync
//!
//! This crate provides the shared domain types used across all
//! MarketSync crates.
//!
//! # Modules
//!
//! - [`types`] - Shared domain types (Symbol, Bar, OptionContract, etc.)

pub mod types;

pub use types::*;
