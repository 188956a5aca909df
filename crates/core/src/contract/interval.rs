//! Half-open validity intervals for system-versioned rows

use super::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The half-open range `[start, end)` during which a row version was current
///
/// `end == Timestamp::MAX` marks the open (current) version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidityInterval {
    /// First instant at which this version was current (`row_start`)
    pub start: Timestamp,
    /// First instant at which this version was no longer current (`row_end`)
    pub end: Timestamp,
}

impl ValidityInterval {
    /// Open interval starting at `start`
    pub const fn open(start: Timestamp) -> Self {
        ValidityInterval {
            start,
            end: Timestamp::MAX,
        }
    }

    /// Closed interval `[start, end)`
    pub const fn closed(start: Timestamp, end: Timestamp) -> Self {
        ValidityInterval { start, end }
    }

    /// True if this is the current version
    #[inline]
    pub fn is_open(&self) -> bool {
        self.end.is_open()
    }

    /// True if `t` falls inside `[start, end)`
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }

    /// True if the two intervals share at least one instant
    pub fn overlaps(&self, other: &ValidityInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Close an open interval at `at`
    pub fn close_at(self, at: Timestamp) -> Self {
        ValidityInterval {
            start: self.start,
            end: at,
        }
    }
}

impl fmt::Display for ValidityInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(micros: u64) -> Timestamp {
        Timestamp::from_micros(micros)
    }

    #[test]
    fn test_half_open_containment() {
        let iv = ValidityInterval::closed(ts(10), ts(20));
        assert!(iv.contains(ts(10)));
        assert!(iv.contains(ts(19)));
        assert!(!iv.contains(ts(20)));
        assert!(!iv.contains(ts(9)));
    }

    #[test]
    fn test_open_interval() {
        let iv = ValidityInterval::open(ts(10));
        assert!(iv.is_open());
        assert!(iv.contains(ts(u64::MAX - 1)));
        let closed = iv.close_at(ts(15));
        assert!(!closed.is_open());
        assert_eq!(closed.end, ts(15));
    }

    #[test]
    fn test_adjacent_intervals_do_not_overlap() {
        let a = ValidityInterval::closed(ts(10), ts(20));
        let b = ValidityInterval::open(ts(20));
        let c = ValidityInterval::closed(ts(15), ts(25));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_display() {
        let iv = ValidityInterval::open(ts(1_000_000));
        assert_eq!(iv.to_string(), "[1.000000, open)");
    }
}
