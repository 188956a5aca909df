//! In-memory reference record store
//!
//! Implements [`RecordStore`], [`TemporalCatalog`] and [`EngineMetadata`]
//! over plain maps behind one `parking_lot::RwLock`. It exists so that the
//! capability layer can be exercised end to end without a database.
//!
//! ## System versioning
//!
//! Once a table is versioned, every `put` closes the open interval of the
//! row (if any) and opens a new one; `delete` closes it without opening
//! another. Interval starts come from a pluggable [`Clock`] and are forced
//! to be strictly increasing, so two writes within the same microsecond
//! still produce ordered, non-overlapping history. The period bounds live in
//! [`HistoryRow::interval`]; they are not copied into row attributes.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_core::{
    validate_identifier, EngineMetadata, Error, HistoryRow, PeriodColumns, RecordId, RecordStore,
    Result, Row, TemporalCatalog, Timestamp, ValidityInterval,
};

/// Version string reported by a store built with [`InMemoryStore::new`]
pub const DEFAULT_ENGINE_VERSION: &str = "10.11.2-MariaDB";

/// Source of interval timestamps
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Clock stopped at `start`
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            micros: AtomicU64::new(start.as_micros()),
        }
    }

    /// Jump to `at`
    pub fn set(&self, at: Timestamp) {
        self.micros.store(at.as_micros(), Ordering::SeqCst);
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        let delta = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        let _ = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |m| {
                Some(m.saturating_add(delta))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<RecordId, Row>,
    versioning: Option<PeriodColumns>,
    history: BTreeMap<RecordId, Vec<HistoryRow>>,
}

impl Table {
    /// Close the open version of `id`, if there is one
    fn close_current(&mut self, id: RecordId, at: Timestamp) {
        if let Some(last) = self
            .history
            .get_mut(&id)
            .and_then(|versions| versions.last_mut())
        {
            if last.interval.is_open() {
                last.interval = last.interval.close_at(at);
            }
        }
    }

    fn open_version(&mut self, row: Row, at: Timestamp) {
        self.history.entry(row.id).or_default().push(HistoryRow {
            row,
            interval: ValidityInterval::open(at),
        });
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    last_tick: Option<Timestamp>,
}

impl State {
    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::Store(format!("unknown table '{}'", name)))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::Store(format!("unknown table '{}'", name)))
    }

    /// Next interval boundary: the clock's time, bumped past the previous one
    fn tick(&mut self, clock: &dyn Clock) -> Timestamp {
        let now = clock.now();
        let next = match self.last_tick {
            Some(last) if now <= last => last.next(),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }
}

/// Thread-safe in-memory store for tests and examples
pub struct InMemoryStore {
    state: RwLock<State>,
    clock: Arc<dyn Clock>,
    engine_version: RwLock<String>,
}

impl InMemoryStore {
    /// Empty store on the wall clock, reporting [`DEFAULT_ENGINE_VERSION`]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty store on an explicit clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        InMemoryStore {
            state: RwLock::new(State::default()),
            clock,
            engine_version: RwLock::new(DEFAULT_ENGINE_VERSION.to_string()),
        }
    }

    /// Report `version` from `engine_version()` (builder pattern)
    pub fn with_engine_version(self, version: impl Into<String>) -> Self {
        self.set_engine_version(version);
        self
    }

    /// Change the reported engine version
    pub fn set_engine_version(&self, version: impl Into<String>) {
        *self.engine_version.write() = version.into();
    }

    /// Create a table; returns `false` if it already existed
    pub fn create_table(&self, name: &str) -> Result<bool> {
        validate_identifier(name)?;
        let mut state = self.state.write();
        if state.tables.contains_key(name) {
            return Ok(false);
        }
        state.tables.insert(name.to_string(), Table::default());
        tracing::debug!(target: "strata::engine", table = name, "Table created");
        Ok(true)
    }

    /// True if the table exists
    pub fn has_table(&self, name: &str) -> bool {
        self.state.read().tables.contains_key(name)
    }

    /// Period columns of a versioned table
    pub fn period_columns(&self, table: &str) -> Result<Option<PeriodColumns>> {
        Ok(self.state.read().table(table)?.versioning.clone())
    }

    /// Number of current rows in a table
    pub fn len(&self, table: &str) -> Result<usize> {
        Ok(self.state.read().table(table)?.rows.len())
    }

    /// True if the table holds no current rows
    pub fn is_empty(&self, table: &str) -> Result<bool> {
        Ok(self.len(table)? == 0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        let mut tables: Vec<&str> = state.tables.keys().map(String::as_str).collect();
        tables.sort_unstable();
        f.debug_struct("InMemoryStore")
            .field("tables", &tables)
            .field("engine_version", &*self.engine_version.read())
            .finish()
    }
}

impl RecordStore for InMemoryStore {
    fn get(&self, table: &str, id: RecordId) -> Result<Option<Row>> {
        Ok(self.state.read().table(table)?.rows.get(&id).cloned())
    }

    fn scan(&self, table: &str) -> Result<Vec<Row>> {
        Ok(self.state.read().table(table)?.rows.values().cloned().collect())
    }

    fn put(&self, table: &str, row: Row) -> Result<()> {
        let mut state = self.state.write();
        let versioned = state.table(table)?.versioning.is_some();
        let at = if versioned {
            Some(state.tick(self.clock.as_ref()))
        } else {
            None
        };
        let t = state.table_mut(table)?;
        if let Some(at) = at {
            t.close_current(row.id, at);
            t.open_version(row.clone(), at);
        }
        t.rows.insert(row.id, row);
        Ok(())
    }

    fn delete(&self, table: &str, id: RecordId) -> Result<bool> {
        let mut state = self.state.write();
        let t = state.table(table)?;
        if !t.rows.contains_key(&id) {
            return Ok(false);
        }
        let versioned = t.versioning.is_some();
        let at = if versioned {
            Some(state.tick(self.clock.as_ref()))
        } else {
            None
        };
        let t = state.table_mut(table)?;
        if let Some(at) = at {
            t.close_current(id, at);
        }
        t.rows.remove(&id);
        Ok(true)
    }

    fn history(&self, table: &str, id: RecordId) -> Result<Vec<HistoryRow>> {
        let state = self.state.read();
        let t = state.table(table)?;
        if t.versioning.is_none() {
            return Err(Error::NotVersioned {
                table: table.to_string(),
            });
        }
        Ok(t.history.get(&id).cloned().unwrap_or_default())
    }
}

impl TemporalCatalog for InMemoryStore {
    fn is_system_versioned(&self, table: &str) -> Result<bool> {
        Ok(self.state.read().table(table)?.versioning.is_some())
    }

    fn add_system_versioning(&self, table: &str, columns: &PeriodColumns) -> Result<()> {
        validate_identifier(&columns.start)?;
        validate_identifier(&columns.end)?;
        let mut state = self.state.write();
        if state.table(table)?.versioning.is_some() {
            return Err(Error::AlreadyEnabled {
                table: table.to_string(),
            });
        }
        let at = state.tick(self.clock.as_ref());
        let t = state.table_mut(table)?;
        t.versioning = Some(columns.clone());

        // Rows present at enablement become current as of now
        let existing: Vec<Row> = t.rows.values().cloned().collect();
        let opened = existing.len();
        for row in existing {
            t.open_version(row, at);
        }
        tracing::debug!(
            target: "strata::engine",
            table,
            opened,
            "Period columns added"
        );
        Ok(())
    }
}

impl EngineMetadata for InMemoryStore {
    fn engine_version(&self) -> Result<String> {
        Ok(self.engine_version.read().clone())
    }
}
