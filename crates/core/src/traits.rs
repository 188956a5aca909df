//! Boundary traits for the collaborators around the extension layer
//!
//! The extension components never own rows. They talk to the relational
//! engine through these traits, which lets a SQL-backed store and the
//! in-memory reference store be swapped without touching upper layers.
//!
//! Thread safety: implementations must be safe to call concurrently from
//! multiple threads (requires Send + Sync).

use crate::error::Result;
use crate::record::{HistoryRow, RecordId, Row};
use serde::{Deserialize, Serialize};

/// Filter evaluated against a row by stores that scan in-process
pub trait RowFilter {
    /// True if the row satisfies the filter
    fn matches(&self, row: &Row) -> bool;
}

impl<F> RowFilter for F
where
    F: Fn(&Row) -> bool,
{
    fn matches(&self, row: &Row) -> bool {
        self(row)
    }
}

/// Row storage owned by the relational engine
///
/// For system-versioned tables the store, not the caller, maintains the
/// validity intervals: `put` closes the current version and opens a new one,
/// `delete` closes the current version without opening another.
pub trait RecordStore: Send + Sync {
    /// Get the current version of a row
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or the read fails.
    fn get(&self, table: &str, id: RecordId) -> Result<Option<Row>>;

    /// Current versions of every row, in primary-key order
    fn scan(&self, table: &str) -> Result<Vec<Row>>;

    /// Current rows matching `filter`
    ///
    /// The default implementation scans and filters in-process. SQL-backed
    /// stores override this to push the predicate down.
    fn select(&self, table: &str, filter: &dyn RowFilter) -> Result<Vec<Row>> {
        Ok(self
            .scan(table)?
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect())
    }

    /// Insert or replace a row
    fn put(&self, table: &str, row: Row) -> Result<()>;

    /// Delete a row, returning whether it existed
    fn delete(&self, table: &str, id: RecordId) -> Result<bool>;

    /// All physical versions of a row in a system-versioned table
    ///
    /// Order is unspecified; callers sort by interval start.
    fn history(&self, table: &str, id: RecordId) -> Result<Vec<HistoryRow>>;
}

/// Names of the period column pair added by system versioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodColumns {
    /// Column holding the interval start (`GENERATED ALWAYS AS ROW START`)
    pub start: String,
    /// Column holding the interval end (`GENERATED ALWAYS AS ROW END`)
    pub end: String,
}

impl Default for PeriodColumns {
    fn default() -> Self {
        PeriodColumns {
            start: "row_start".to_string(),
            end: "row_end".to_string(),
        }
    }
}

/// Schema catalog queries and mutations for system versioning
pub trait TemporalCatalog: Send + Sync {
    /// True if the table is already system-versioned
    fn is_system_versioned(&self, table: &str) -> Result<bool>;

    /// Add the period columns and turn on system versioning
    ///
    /// Callers check [`is_system_versioned`](Self::is_system_versioned)
    /// first. Another caller can still get there in between, so a table
    /// that is already versioned when the mutation runs yields
    /// `AlreadyEnabled` and is left untouched.
    fn add_system_versioning(&self, table: &str, columns: &PeriodColumns) -> Result<()>;
}

/// Engine identification (`SELECT VERSION()`)
pub trait EngineMetadata: Send + Sync {
    /// Raw version string, e.g. `10.11.2-MariaDB`
    fn engine_version(&self) -> Result<String>;
}

/// Source of content embeddings
///
/// Whatever an implementation returns must have exactly
/// [`dimension`](Self::dimension) elements.
pub trait EmbeddingGenerator: Send + Sync {
    /// Number of elements in every produced vector
    fn dimension(&self) -> usize;

    /// Compute the embedding of `text`
    fn embed(&self, text: &str) -> Result<Vec<f64>>;
}
