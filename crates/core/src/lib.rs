//! Core types and traits for Strata relational extensions
//!
//! This crate defines the foundational types shared by the vector, temporal
//! and JSON extensions:
//! - Error: the single error taxonomy of the extension layer
//! - Timestamp / ValidityInterval: period-column values
//! - JsonPath: dotted paths into metadata documents
//! - Value / Row / RecordId: what flows to and from the record store
//! - SqlFragment: parameterized SQL for MariaDB-backed stores
//! - Traits: RecordStore, TemporalCatalog, EngineMetadata, EmbeddingGenerator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod error;
pub mod json;
pub mod record;
pub mod sql;
pub mod traits;
pub mod value;

pub use contract::{Timestamp, ValidityInterval};
pub use error::{Error, Result};
pub use json::{
    delete_at_path, get_at_path, set_at_path, validate_document, JsonPath, JsonPathError,
    LimitError, PathParseError, PathSegment, MAX_ARRAY_SIZE, MAX_DOCUMENT_SIZE,
    MAX_NESTING_DEPTH, MAX_PATH_LENGTH,
};
pub use record::{HistoryRow, RecordId, Row};
pub use sql::{quote_identifier, validate_identifier, SqlFragment};
pub use traits::{
    EmbeddingGenerator, EngineMetadata, PeriodColumns, RecordStore, RowFilter, TemporalCatalog,
};
pub use value::Value;
