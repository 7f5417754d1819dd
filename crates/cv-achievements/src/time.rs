//! Time utilities for cv-achievements.
//!
//! Claim timestamps are Unix epoch seconds (i64). The wall clock is
//! injected through [`Clock`] so expiry can be tested at exact boundaries.

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of "now" in Unix seconds.
pub trait Clock {
    fn now_secs(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.0
    }
}

/// Return the current time as seconds since Unix epoch.
pub fn now_secs() -> i64 {
    SystemClock.now_secs()
}

/// Convert Unix seconds to an ISO calendar date (`YYYY-MM-DD`, UTC).
pub fn secs_to_iso_date(secs: i64) -> String {
    to_datetime(secs).format("%Y-%m-%d").to_string()
}

/// Convert Unix seconds to an RFC 3339 string with millisecond precision.
pub fn secs_to_rfc3339(secs: i64) -> String {
    to_datetime(secs).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format Unix seconds for human display.
pub fn secs_to_display(secs: i64) -> String {
    to_datetime(secs).format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Whether `secs` falls inside the range a calendar date can be rendered for.
pub fn is_representable(secs: i64) -> bool {
    DateTime::from_timestamp(secs, 0).is_some()
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| {
        log::warn!("timestamp {secs} is out of range, rendering as the Unix epoch");
        DateTime::UNIX_EPOCH
    })
}
