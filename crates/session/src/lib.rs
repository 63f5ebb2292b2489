//! Trading calendar and market-hours gate for MarketSync
//!
//! Sessions are defined in exchange-local time using `chrono_tz`, so DST
//! transitions are handled automatically. The [`SessionGate`] answers the
//! one question the collector cares about: is this asset class trading
//! right now?
//!
//! # Example
//!
//! ```ignore
//! use session::SessionGate;
//! use chrono::Utc;
//!
//! let gate = SessionGate::us_equity(false);
//! if gate.is_equity_open(Utc::now()) {
//!     // fetch away
//! }
//! ```

pub mod gate;
pub mod schedule;

pub use gate::SessionGate;
pub use schedule::{presets, MarketCalendar, SessionSchedule, TradingSession};
