//! Server infrastructure for MarketSync
//!
//! Provides the HTTP health endpoint and unified lifecycle management.
//! Servers implement the [`Server`] trait; [`ServerExt`] adds convenience
//! methods like `spawn()` and `run_with_ctrl_c()`. Shutdown coordination
//! uses `CancellationToken` from `tokio_util`, so cancelling a parent
//! token cancels every child.
//!
//! # Modules
//!
//! - [`config`] - Server bind configuration
//! - [`traits`] - `Server` and `ServerExt` traits
//! - [`http`] - HTTP server using Axum
//! - [`health`] - Health check state and routes
//! - [`shutdown`] - Graceful shutdown utilities

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod shutdown;
pub mod traits;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use health::{health_routes, ComponentStatus, HealthState};
pub use http::HttpServer;
pub use shutdown::{run_until_shutdown, ShutdownController};
pub use traits::{Server, ServerExt};
