//! Session schedules and market calendars.
//!
//! A [`SessionSchedule`] combines the exchange timezone, one or more
//! daily trading sessions, and a [`MarketCalendar`] of holidays and
//! early closes.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single trading session within a day, in exchange-local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSession {
    /// Session name (e.g., "Regular")
    pub name: String,

    /// Days this session is active
    pub active_days: Vec<Weekday>,

    /// Session start time (local timezone)
    #[serde(with = "time_serde")]
    pub start_time: NaiveTime,

    /// Session end time (local timezone)
    #[serde(with = "time_serde")]
    pub end_time: NaiveTime,
}

impl TradingSession {
    pub fn new(
        name: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        active_days: Vec<Weekday>,
    ) -> Self {
        Self {
            name: name.into(),
            active_days,
            start_time,
            end_time,
        }
    }

    /// Check if this session is active at the given day and time
    pub fn is_active(&self, weekday: Weekday, time: NaiveTime) -> bool {
        if !self.active_days.contains(&weekday) {
            return false;
        }
        time >= self.start_time && time < self.end_time
    }
}

/// Custom serde module for NaiveTime
mod time_serde {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M:%S").map_err(serde::de::Error::custom)
    }
}

/// Market calendar with holidays and early closes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketCalendar {
    /// Holiday dates (market closed all day)
    #[serde(default)]
    pub holidays: HashMap<NaiveDate, String>,

    /// Early close dates with close time
    #[serde(default)]
    pub early_closes: HashMap<NaiveDate, NaiveTime>,
}

impl MarketCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_holiday(&mut self, date: NaiveDate, description: impl Into<String>) {
        self.holidays.insert(date, description.into());
    }

    pub fn add_early_close(&mut self, date: NaiveDate, close_time: NaiveTime) {
        self.early_closes.insert(date, close_time);
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    pub fn early_close(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.early_closes.get(&date).copied()
    }
}

/// Complete session schedule for an asset class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSchedule {
    /// Exchange timezone (e.g., "America/New_York")
    #[serde(with = "tz_serde")]
    pub timezone: Tz,

    /// Trading sessions
    #[serde(default)]
    pub sessions: Vec<TradingSession>,

    /// Holiday calendar
    #[serde(default)]
    pub calendar: MarketCalendar,
}

/// Custom serde module for chrono_tz::Tz
mod tz_serde {
    use chrono_tz::Tz;
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl SessionSchedule {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            sessions: Vec::new(),
            calendar: MarketCalendar::default(),
        }
    }

    pub fn with_session(mut self, session: TradingSession) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn with_holiday(mut self, date: NaiveDate, description: impl Into<String>) -> Self {
        self.calendar.add_holiday(date, description);
        self
    }

    pub fn with_early_close(mut self, date: NaiveDate, close_time: NaiveTime) -> Self {
        self.calendar.add_early_close(date, close_time);
        self
    }

    /// Check if the market is open at the given UTC time.
    ///
    /// Converts to exchange-local time, then checks the holiday calendar,
    /// early closes, and session windows in that order.
    pub fn is_open(&self, utc_time: DateTime<Utc>) -> bool {
        let local_time = utc_time.with_timezone(&self.timezone);
        let date = local_time.date_naive();
        let time = local_time.time();
        let weekday = local_time.weekday();

        if self.calendar.is_holiday(date) {
            return false;
        }

        if let Some(close) = self.calendar.early_close(date) {
            if time >= close {
                return false;
            }
        }

        self.sessions.iter().any(|s| s.is_active(weekday, time))
    }
}

/// Predefined schedules for common markets.
pub mod presets {
    use super::*;

    fn us_weekdays() -> Vec<Weekday> {
        vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
    }

    fn hms(h: u32, m: u32) -> NaiveTime {
        // Static times, always valid
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    /// NYSE/NASDAQ regular-hours schedule with the exchange holiday
    /// calendar for 2025-2026.
    pub fn us_equity() -> SessionSchedule {
        let mut schedule = SessionSchedule::new(chrono_tz::America::New_York).with_session(
            TradingSession::new("Regular", hms(9, 30), hms(16, 0), us_weekdays()),
        );

        let holidays = [
            (ymd(2025, 1, 1), "New Year's Day"),
            (ymd(2025, 1, 20), "Martin Luther King Jr. Day"),
            (ymd(2025, 2, 17), "Washington's Birthday"),
            (ymd(2025, 4, 18), "Good Friday"),
            (ymd(2025, 5, 26), "Memorial Day"),
            (ymd(2025, 6, 19), "Juneteenth"),
            (ymd(2025, 7, 4), "Independence Day"),
            (ymd(2025, 9, 1), "Labor Day"),
            (ymd(2025, 11, 27), "Thanksgiving Day"),
            (ymd(2025, 12, 25), "Christmas Day"),
            (ymd(2026, 1, 1), "New Year's Day"),
            (ymd(2026, 1, 19), "Martin Luther King Jr. Day"),
            (ymd(2026, 2, 16), "Washington's Birthday"),
            (ymd(2026, 4, 3), "Good Friday"),
            (ymd(2026, 5, 25), "Memorial Day"),
            (ymd(2026, 6, 19), "Juneteenth"),
            (ymd(2026, 7, 3), "Independence Day (observed)"),
            (ymd(2026, 9, 7), "Labor Day"),
            (ymd(2026, 11, 26), "Thanksgiving Day"),
            (ymd(2026, 12, 25), "Christmas Day"),
        ];
        for (date, name) in holidays {
            schedule.calendar.add_holiday(date, name);
        }

        let early_closes = [
            ymd(2025, 7, 3),
            ymd(2025, 11, 28),
            ymd(2025, 12, 24),
            ymd(2026, 11, 27),
            ymd(2026, 12, 24),
        ];
        for date in early_closes {
            schedule.calendar.add_early_close(date, hms(13, 0));
        }

        schedule
    }

    /// US listed equity options trade the same regular session as the
    /// underlying equities.
    pub fn us_equity_options() -> SessionSchedule {
        us_equity()
    }
}
