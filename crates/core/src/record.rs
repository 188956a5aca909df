//! Rows exchanged with the record store

use crate::contract::ValidityInterval;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity (primary key) of a logical row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

/// A row: identity plus attribute mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Primary key
    pub id: RecordId,
    /// Column name to value
    pub attributes: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new(id: impl Into<RecordId>) -> Self {
        Row {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute (builder pattern)
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    /// Set an attribute in place
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(column.into(), value.into());
    }

    /// Get an attribute; a missing column reads as `None`
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }
}

/// One physical row of a system-versioned table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Full attribute snapshot
    pub row: Row,
    /// When this snapshot was the current version
    pub interval: ValidityInterval,
}
