//! The session gate used by the fetch and sync layers.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::schedule::{presets, SessionSchedule};

/// Market-hours gate for the asset classes the collector handles.
///
/// The gate is cheap to query and shared behind an `Arc`. The force-open
/// override exists for tests and off-hours backfills; when set, both
/// predicates answer true regardless of the calendar.
pub struct SessionGate {
    equity: SessionSchedule,
    options: SessionSchedule,
    force_open: AtomicBool,
}

impl SessionGate {
    pub fn new(equity: SessionSchedule, options: SessionSchedule) -> Self {
        Self {
            equity,
            options,
            force_open: AtomicBool::new(false),
        }
    }

    /// Gate for US equities and their listed options
    pub fn us_equity(force_open: bool) -> Self {
        let gate = Self::new(presets::us_equity(), presets::us_equity_options());
        gate.force_open.store(force_open, Ordering::Relaxed);
        gate
    }

    /// Toggle the testing override
    pub fn set_force_open(&self, force: bool) {
        self.force_open.store(force, Ordering::Relaxed);
    }

    pub fn is_forced_open(&self) -> bool {
        self.force_open.load(Ordering::Relaxed)
    }

    /// Is the equity market open at `now`?
    pub fn is_equity_open(&self, now: DateTime<Utc>) -> bool {
        self.is_forced_open() || self.equity.is_open(now)
    }

    /// Is the options market open at `now`?
    pub fn is_options_open(&self, now: DateTime<Utc>) -> bool {
        self.is_forced_open() || self.options.is_open(now)
    }
}
