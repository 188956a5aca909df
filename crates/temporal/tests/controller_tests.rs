//! Controller behavior against scripted catalog and store doubles
//!
//! Covers:
//! - double enable returns AlreadyEnabled and leaves the schema alone
//! - precondition failures never reach the catalog
//! - failed mutations abort back to Disabled
//! - history ordering, range exclusion and point-in-time reads

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::{
    EngineMetadata, Error, HistoryRow, PeriodColumns, RecordId, RecordStore, Result, Row,
    TemporalCatalog, Timestamp, ValidityInterval, Value,
};
use strata_temporal::{
    EngineSession, HistoryRange, TemporalController, TemporalPolicy, TemporalState,
};

struct FixedVersion(&'static str);

impl EngineMetadata for FixedVersion {
    fn engine_version(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
struct ScriptedCatalog {
    versioned: Mutex<HashMap<String, PeriodColumns>>,
    mutations: Mutex<usize>,
    fail_next: Mutex<bool>,
}

impl TemporalCatalog for ScriptedCatalog {
    fn is_system_versioned(&self, table: &str) -> Result<bool> {
        Ok(self.versioned.lock().contains_key(table))
    }

    fn add_system_versioning(&self, table: &str, columns: &PeriodColumns) -> Result<()> {
        *self.mutations.lock() += 1;
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err(Error::Store("lock wait timeout".to_string()));
        }
        let mut versioned = self.versioned.lock();
        if versioned.contains_key(table) {
            return Err(Error::AlreadyEnabled {
                table: table.to_string(),
            });
        }
        versioned.insert(table.to_string(), columns.clone());
        Ok(())
    }
}

struct HistoryOnlyStore {
    rows: Vec<HistoryRow>,
}

impl RecordStore for HistoryOnlyStore {
    fn get(&self, _table: &str, _id: RecordId) -> Result<Option<Row>> {
        Ok(None)
    }

    fn scan(&self, _table: &str) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn put(&self, _table: &str, _row: Row) -> Result<()> {
        Err(Error::Store("read only".to_string()))
    }

    fn delete(&self, _table: &str, _id: RecordId) -> Result<bool> {
        Err(Error::Store("read only".to_string()))
    }

    fn history(&self, _table: &str, id: RecordId) -> Result<Vec<HistoryRow>> {
        Ok(self.rows.iter().filter(|h| h.row.id == id).cloned().collect())
    }
}

fn session(version: &'static str) -> EngineSession {
    EngineSession::new(Arc::new(FixedVersion(version)))
}

fn ts(secs: u64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn snapshot(id: u64, title: &str, start: u64, end: Option<u64>) -> HistoryRow {
    HistoryRow {
        row: Row::new(id).with("title", title),
        interval: match end {
            Some(e) => ValidityInterval::closed(ts(start), ts(e)),
            None => ValidityInterval::open(ts(start)),
        },
    }
}

#[test]
fn enable_twice_reports_already_enabled() {
    let catalog = ScriptedCatalog::default();
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);

    assert_eq!(controller.state("blog_post").unwrap(), TemporalState::Disabled);
    assert_eq!(controller.enable("blog_post").unwrap(), TemporalState::Enabled);

    let err = controller.enable("blog_post").unwrap_err();
    assert!(matches!(err, Error::AlreadyEnabled { ref table } if table == "blog_post"));
    assert!(err.is_noop());
    assert_eq!(*catalog.mutations.lock(), 1);
    assert_eq!(controller.state("blog_post").unwrap(), TemporalState::Enabled);
}

#[test]
fn ensure_enabled_is_idempotent() {
    let catalog = ScriptedCatalog::default();
    let session = session("10.6.12-MariaDB-1:10.6.12+maria~ubu2004");
    let controller = TemporalController::new(&catalog, &session);

    assert_eq!(controller.ensure_enabled("blog_post").unwrap(), TemporalState::Enabled);
    assert_eq!(controller.ensure_enabled("blog_post").unwrap(), TemporalState::Enabled);
    assert_eq!(*catalog.mutations.lock(), 1);
}

#[test]
fn unsupported_engine_never_mutates() {
    let catalog = ScriptedCatalog::default();
    let session = session("8.0.33");
    let controller = TemporalController::new(&catalog, &session);

    let err = controller.enable("blog_post").unwrap_err();
    assert!(matches!(err, Error::UnsupportedEngine { .. }));
    assert!(err.is_precondition_failure());
    assert_eq!(*catalog.mutations.lock(), 0);
    assert_eq!(controller.state("blog_post").unwrap(), TemporalState::Disabled);
}

#[test]
fn old_engine_is_version_too_low() {
    let catalog = ScriptedCatalog::default();
    let session = session("10.2.44-MariaDB");
    let controller = TemporalController::new(&catalog, &session);

    assert!(matches!(
        controller.enable("blog_post"),
        Err(Error::VersionTooLow { .. })
    ));
    assert_eq!(*catalog.mutations.lock(), 0);
}

#[test]
fn configured_minimum_is_respected() {
    let catalog = ScriptedCatalog::default();
    let session = session("10.4.0-MariaDB");
    let policy = TemporalPolicy {
        min_version: "10.5.0".parse().unwrap(),
        columns: PeriodColumns {
            start: "valid_from".to_string(),
            end: "valid_to".to_string(),
        },
    };
    let controller = TemporalController::with_policy(&catalog, &session, policy);
    assert!(matches!(
        controller.enable("blog_post"),
        Err(Error::VersionTooLow { .. })
    ));

    let session = self::session("10.5.1-MariaDB");
    let controller =
        TemporalController::with_policy(&catalog, &session, controller.policy().clone());
    controller.enable("blog_post").unwrap();
    assert_eq!(
        catalog.versioned.lock().get("blog_post").map(|c| c.start.clone()),
        Some("valid_from".to_string())
    );
}

#[test]
fn failed_mutation_can_be_retried() {
    let catalog = ScriptedCatalog::default();
    *catalog.fail_next.lock() = true;
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);

    assert!(matches!(controller.enable("blog_post"), Err(Error::Store(_))));
    assert_eq!(controller.state("blog_post").unwrap(), TemporalState::Disabled);

    assert_eq!(controller.enable("blog_post").unwrap(), TemporalState::Enabled);
    assert_eq!(*catalog.mutations.lock(), 2);
}

#[test]
fn invalid_table_name_is_rejected_before_catalog() {
    let catalog = ScriptedCatalog::default();
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);
    assert!(matches!(
        controller.enable("blog_post; DROP TABLE users"),
        Err(Error::InvalidIdentifier { .. })
    ));
    assert_eq!(*catalog.mutations.lock(), 0);
}

fn versioned_fixture() -> (ScriptedCatalog, HistoryOnlyStore) {
    let catalog = ScriptedCatalog::default();
    catalog
        .versioned
        .lock()
        .insert("blog_post".to_string(), PeriodColumns::default());
    // Deliberately out of order
    let store = HistoryOnlyStore {
        rows: vec![
            snapshot(1, "Third", 30, None),
            snapshot(1, "First", 10, Some(20)),
            snapshot(2, "Other", 5, None),
            snapshot(1, "Second", 20, Some(30)),
        ],
    };
    (catalog, store)
}

fn titles(versions: &[strata_temporal::VersionedRecord]) -> Vec<String> {
    versions
        .iter()
        .filter_map(|v| v.get("title").and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[test]
fn full_history_is_ordered_and_ends_open() {
    let (catalog, store) = versioned_fixture();
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);

    let history = controller
        .query_history(&store, "blog_post", RecordId(1), &HistoryRange::all())
        .unwrap();
    assert_eq!(titles(&history), vec!["First", "Second", "Third"]);
    assert!(history.windows(2).all(|w| w[0].interval.start < w[1].interval.start));
    let last = history.last().unwrap();
    assert!(last.is_current());
    assert_eq!(last.interval.end, Timestamp::MAX);
}

#[test]
fn history_range_excludes_outside_snapshots() {
    let (catalog, store) = versioned_fixture();
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);

    // "First" ends at 20 < 21; "Third" starts at 30 > 29
    let history = controller
        .query_history(
            &store,
            "blog_post",
            RecordId(1),
            &HistoryRange::between(ts(21), ts(29)),
        )
        .unwrap();
    assert_eq!(titles(&history), vec!["Second"]);

    let since = controller
        .query_history(&store, "blog_post", RecordId(1), &HistoryRange::since(ts(25)))
        .unwrap();
    assert_eq!(titles(&since), vec!["Second", "Third"]);
}

#[test]
fn as_of_picks_containing_snapshot() {
    let (catalog, store) = versioned_fixture();
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);

    let at = |secs| {
        controller
            .as_of(&store, "blog_post", RecordId(1), ts(secs))
            .unwrap()
            .and_then(|v| v.get("title").and_then(Value::as_str).map(str::to_string))
    };
    assert_eq!(at(5), None);
    assert_eq!(at(10).as_deref(), Some("First"));
    assert_eq!(at(20).as_deref(), Some("Second"));
    assert_eq!(at(1_000).as_deref(), Some("Third"));
}

#[test]
fn history_on_plain_table_fails() {
    let catalog = ScriptedCatalog::default();
    let store = HistoryOnlyStore { rows: Vec::new() };
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);
    assert!(matches!(
        controller.query_history(&store, "comments", RecordId(1), &HistoryRange::all()),
        Err(Error::NotVersioned { .. })
    ));
}

#[test]
fn overlapping_store_history_is_rejected() {
    let (catalog, _) = versioned_fixture();
    let store = HistoryOnlyStore {
        rows: vec![
            snapshot(1, "A", 10, Some(25)),
            snapshot(1, "B", 20, None),
        ],
    };
    let session = session("10.11.2-MariaDB");
    let controller = TemporalController::new(&catalog, &session);
    assert!(matches!(
        controller.query_history(&store, "blog_post", RecordId(1), &HistoryRange::all()),
        Err(Error::InconsistentHistory { .. })
    ));
}
