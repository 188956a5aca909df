//! Strata relational extensions
//!
//! Three capabilities for relational record stores, each in its own crate
//! and re-exported here:
//!
//! - [`vector`]: fixed-dimension embeddings with exact similarity search
//! - [`temporal`]: system-versioned tables with time-ranged history
//! - [`json`]: schema-free metadata with path predicates
//!
//! [`engine`] composes them per entity type and ships an in-memory store.
//!
//! # Quick Start
//!
//! ```
//! use strata_relational::prelude::*;
//! use strata_relational::json::build_equality_predicate;
//!
//! let store = InMemoryStore::new();
//! store.create_table("post")?;
//! store.put("post", Row::new(1).with("metadata", serde_json::json!({"category": "Tutorial"})))?;
//!
//! let tutorials = build_equality_predicate("metadata", "category", "Tutorial")?;
//! assert_eq!(store.select("post", &tutorials)?.len(), 1);
//! # Ok::<(), strata_relational::Error>(())
//! ```

pub use strata_core::{Error, Result};

/// Contract types and collaborator traits
pub use strata_core as core;
/// Capability traits, configuration and the in-memory store
pub use strata_engine as engine;
/// JSON metadata documents and predicates
pub use strata_json as json;
/// System-versioned tables
pub use strata_temporal as temporal;
/// Vector codec and similarity search
pub use strata_vector as vector;

/// Common imports
pub mod prelude {
    pub use strata_core::{
        EmbeddingGenerator, EngineMetadata, Error, RecordId, RecordStore, Result, Row, RowFilter,
        TemporalCatalog, Timestamp, Value,
    };
    pub use strata_engine::{
        mutate_document, Entity, InMemoryStore, JsonQueryable, RelationalConfig,
        TemporallyVersioned, VectorSearchable,
    };
    pub use strata_json::{MetadataDocument, Predicate};
    pub use strata_temporal::{EngineSession, HistoryRange, TemporalController, TemporalState};
    pub use strata_vector::{SearchOptions, SimilarityResult, VectorField};
}
