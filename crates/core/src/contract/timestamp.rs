//! Period boundaries
//!
//! A [`Timestamp`] counts microseconds from the Unix epoch, the same
//! resolution as the `TIMESTAMP(6)` period columns of a versioned table.
//! The largest value, [`Timestamp::MAX`], never occurs as a real instant and
//! marks the end of a version that is still current.
//!
//! ```
//! use strata_core::Timestamp;
//!
//! let published = Timestamp::from_secs(1_700_000_000);
//! assert!(published < Timestamp::now());
//! assert!(Timestamp::MAX.is_open());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MICROS_PER_SEC: u64 = 1_000_000;
const MICROS_PER_MILLI: u64 = 1_000;

/// Rendering of the open sentinel in SQL; the largest period end MariaDB stores
const OPEN_PERIOD_LITERAL: &str = "2038-01-19 03:14:07.999999";

/// Microseconds since the Unix epoch
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// 1970-01-01T00:00:00Z
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Open sentinel
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Wall-clock time; a clock set before 1970 reads as `EPOCH`
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| Timestamp::from_micros(elapsed.as_micros() as u64))
            .unwrap_or(Timestamp::EPOCH)
    }

    /// Microseconds since the epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Milliseconds since the epoch, saturating
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(MICROS_PER_MILLI))
    }

    /// Seconds since the epoch, saturating
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(MICROS_PER_SEC))
    }

    /// Microseconds since the epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Whole seconds, rounded down
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.0 / MICROS_PER_SEC
    }

    /// True for [`Timestamp::MAX`]
    #[inline]
    pub const fn is_open(&self) -> bool {
        self.0 == Self::MAX.0
    }

    /// One microsecond later, stopping at `MAX`
    #[inline]
    pub const fn next(&self) -> Self {
        Timestamp(self.0.saturating_add(1))
    }

    /// Time elapsed since `earlier`, or `None` if `earlier` is after `self`
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_micros)
    }

    /// `self + by`, stopping at `MAX`
    pub fn saturating_add(&self, by: Duration) -> Self {
        let micros = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(micros))
    }

    /// Calendar form; `None` for the open sentinel and instants chrono
    /// cannot hold
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if self.is_open() {
            return None;
        }
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_micros)
    }

    /// `YYYY-MM-DD HH:MM:SS.ffffff`, as accepted by `FOR SYSTEM_TIME`
    pub fn to_sql_literal(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            .unwrap_or_else(|| OPEN_PERIOD_LITERAL.to_string())
    }
}

/// `secs.micros`, or `open` for the sentinel
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            f.write_str("open")
        } else {
            write!(f, "{}.{:06}", self.as_secs(), self.0 % MICROS_PER_SEC)
        }
    }
}

impl From<u64> for Timestamp {
    fn from(micros: u64) -> Self {
        Timestamp(micros)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.as_micros()
    }
}

/// Pre-epoch instants become `EPOCH`
impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        u64::try_from(dt.timestamp_micros())
            .map(Timestamp)
            .unwrap_or(Timestamp::EPOCH)
    }
}
