//! Error types for the relational extensions
//!
//! Every failure the extension layer can produce is a variant of [`Error`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//! Nothing is swallowed internally and nothing is retried: callers decide.

use crate::json::{JsonPathError, LimitError, PathParseError};
use crate::record::RecordId;
use thiserror::Error;

/// Result type alias for extension operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the relational extensions
#[derive(Debug, Error)]
pub enum Error {
    /// Vector length and declared dimension disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Declared dimension
        expected: usize,
        /// Actual length of the provided vector
        got: usize,
    },

    /// Stored vector payload has the wrong byte length
    #[error("Corrupt vector: {len} bytes, expected {expected}")]
    CorruptVector {
        /// Length of the payload in bytes
        len: usize,
        /// Expected length in bytes (`dimension * 8`)
        expected: usize,
    },

    /// Value handed to the vector decoder is not a recognized shape
    #[error("Unsupported vector source: {kind}")]
    UnsupportedVectorSource {
        /// Description of the rejected input
        kind: String,
    },

    /// Engine vendor does not support system-versioned tables
    #[error("Unsupported engine: {version}")]
    UnsupportedEngine {
        /// Raw version string reported by the engine
        version: String,
    },

    /// Engine version is below the required minimum
    #[error("Engine version {found} is below required {required}")]
    VersionTooLow {
        /// Version reported by the engine
        found: String,
        /// Minimum version required
        required: String,
    },

    /// System versioning is already enabled on the table
    #[error("System versioning already enabled on {table}")]
    AlreadyEnabled {
        /// Table name
        table: String,
    },

    /// Temporal lifecycle asked to move between states it cannot connect
    #[error("Invalid temporal transition on {table}: {from} -> {to}")]
    InvalidTransition {
        /// Table name
        table: String,
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// Table is not system-versioned
    #[error("Table {table} is not system-versioned")]
    NotVersioned {
        /// Table name
        table: String,
    },

    /// History rows returned by the store break interval invariants
    #[error("Inconsistent history for record {id}: {reason}")]
    InconsistentHistory {
        /// Record identity
        id: RecordId,
        /// Which invariant was violated
        reason: String,
    },

    /// JSON document is malformed or a mutation would make it malformed
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// JSON path could not be parsed
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathParseError),

    /// SQL identifier contains characters that cannot be quoted safely
    #[error("Invalid identifier: {name} ({reason})")]
    InvalidIdentifier {
        /// The rejected identifier
        name: String,
        /// Reason why it was rejected
        reason: String,
    },

    /// Column is not declared as a JSON column on the entity
    #[error("Unknown JSON field {field} on {table}")]
    UnknownJsonField {
        /// Table name
        table: String,
        /// Field name
        field: String,
    },

    /// Record does not exist
    #[error("Record {id} not found in {table}")]
    RecordNotFound {
        /// Table name
        table: String,
        /// Record identity
        id: RecordId,
    },

    /// Record store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration could not be read or is invalid
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for the idempotent no-op signal returned by a repeated enable
    pub fn is_noop(&self) -> bool {
        matches!(self, Error::AlreadyEnabled { .. })
    }

    /// True when temporal enablement preconditions were not met
    pub fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedEngine { .. } | Error::VersionTooLow { .. }
        )
    }

    /// True for failures caused by a malformed or mis-shaped vector
    pub fn is_vector_error(&self) -> bool {
        matches!(
            self,
            Error::DimensionMismatch { .. }
                | Error::CorruptVector { .. }
                | Error::UnsupportedVectorSource { .. }
        )
    }
}

impl From<JsonPathError> for Error {
    fn from(e: JsonPathError) -> Self {
        Error::InvalidDocument(e.to_string())
    }
}

impl From<LimitError> for Error {
    fn from(e: LimitError) -> Self {
        Error::InvalidDocument(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidDocument(e.to_string())
    }
}
