//! Time-ranged history of system-versioned rows
//!
//! The store returns every physical version of a record. This module orders
//! them by interval start, checks the interval invariants, and applies the
//! requested range:
//!
//! - with `start`, versions whose interval ends before `start` are dropped
//! - with `end`, versions whose interval starts after `end` are dropped
//!
//! The bounds compare against the raw interval endpoints, so a version that
//! closed exactly at `start` is kept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_core::{
    Error, HistoryRow, RecordId, RecordStore, Result, Row, TemporalCatalog, Timestamp,
    ValidityInterval, Value,
};

/// Optional `[start, end]` bounds for a history query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRange {
    /// Drop versions whose interval ends before this
    pub start: Option<Timestamp>,
    /// Drop versions whose interval starts after this
    pub end: Option<Timestamp>,
}

impl HistoryRange {
    /// Unbounded: the complete history
    pub fn all() -> Self {
        HistoryRange::default()
    }

    /// Both bounds
    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        HistoryRange {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Lower bound only
    pub fn since(start: Timestamp) -> Self {
        HistoryRange {
            start: Some(start),
            end: None,
        }
    }

    /// Upper bound only
    pub fn until(end: Timestamp) -> Self {
        HistoryRange {
            start: None,
            end: Some(end),
        }
    }

    /// True if a version with this interval is kept
    pub fn includes(&self, interval: &ValidityInterval) -> bool {
        if let Some(start) = self.start {
            if interval.end < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if interval.start > end {
                return false;
            }
        }
        true
    }
}

/// One historical snapshot of a logical row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// Full attribute snapshot
    pub row: Row,
    /// When the snapshot was current
    pub interval: ValidityInterval,
}

impl VersionedRecord {
    /// Record identity
    pub fn id(&self) -> RecordId {
        self.row.id
    }

    /// Attribute of the snapshot
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.row.get(column)
    }

    /// All attributes of the snapshot
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.row.attributes
    }

    /// True if this is the current (open) version
    pub fn is_current(&self) -> bool {
        self.interval.is_open()
    }
}

impl From<HistoryRow> for VersionedRecord {
    fn from(h: HistoryRow) -> Self {
        VersionedRecord {
            row: h.row,
            interval: h.interval,
        }
    }
}

/// Check the interval invariants of a start-ordered history
///
/// - every snapshot belongs to `id`
/// - every interval has `start < end`
/// - consecutive intervals do not overlap
/// - at most one interval is open, and only the last
pub fn validate_history(id: RecordId, versions: &[VersionedRecord]) -> Result<()> {
    let inconsistent = |reason: String| Error::InconsistentHistory { id, reason };

    for v in versions {
        if v.id() != id {
            return Err(inconsistent(format!("snapshot belongs to record {}", v.id())));
        }
        if v.interval.start >= v.interval.end {
            return Err(inconsistent(format!("empty interval {}", v.interval)));
        }
    }
    for pair in versions.windows(2) {
        let (prev, next) = (&pair[0].interval, &pair[1].interval);
        if prev.is_open() {
            return Err(inconsistent(format!(
                "open interval {} is followed by {}",
                prev, next
            )));
        }
        if prev.end > next.start {
            return Err(inconsistent(format!("{} overlaps {}", prev, next)));
        }
    }
    Ok(())
}

/// Snapshots of `id` in `table`, ordered by interval start
///
/// # Errors
///
/// - `NotVersioned` if the table is not system-versioned
/// - `InconsistentHistory` if the store returned overlapping intervals or
///   more than one open interval
pub fn query_history(
    store: &dyn RecordStore,
    catalog: &dyn TemporalCatalog,
    table: &str,
    id: RecordId,
    range: &HistoryRange,
) -> Result<Vec<VersionedRecord>> {
    let versions = load_history(store, catalog, table, id)?;
    let total = versions.len();
    let kept: Vec<VersionedRecord> = versions
        .into_iter()
        .filter(|v| range.includes(&v.interval))
        .collect();

    tracing::debug!(
        target: "strata::temporal",
        table,
        id = id.0,
        total,
        returned = kept.len(),
        "History query complete"
    );
    Ok(kept)
}

/// The snapshot of `id` that was current at `at`, if any
pub fn as_of(
    store: &dyn RecordStore,
    catalog: &dyn TemporalCatalog,
    table: &str,
    id: RecordId,
    at: Timestamp,
) -> Result<Option<VersionedRecord>> {
    let versions = load_history(store, catalog, table, id)?;
    Ok(versions.into_iter().find(|v| v.interval.contains(at)))
}

fn load_history(
    store: &dyn RecordStore,
    catalog: &dyn TemporalCatalog,
    table: &str,
    id: RecordId,
) -> Result<Vec<VersionedRecord>> {
    if !catalog.is_system_versioned(table)? {
        return Err(Error::NotVersioned {
            table: table.to_string(),
        });
    }

    let mut versions: Vec<VersionedRecord> = store
        .history(table, id)?
        .into_iter()
        .map(VersionedRecord::from)
        .collect();
    versions.sort_by_key(|v| v.interval.start);

    if let Err(e) = validate_history(id, &versions) {
        tracing::warn!(
            target: "strata::temporal",
            table,
            id = id.0,
            error = %e,
            "Store returned inconsistent history"
        );
        return Err(e);
    }
    Ok(versions)
}
