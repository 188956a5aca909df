//! Composition layer for the relational extensions
//!
//! This crate wires the lower crates together:
//! - Capabilities: `Entity` plus the opt-in `VectorSearchable`,
//!   `TemporallyVersioned` and `JsonQueryable` traits
//! - Configuration: `strata-relational.toml`
//! - Read-modify-write of rows and JSON documents
//! - `InMemoryStore`: reference `RecordStore` / `TemporalCatalog` /
//!   `EngineMetadata` with a pluggable clock
//!
//! The engine is the only component that knows about all three extensions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod config;
pub mod memory;
pub mod mutate;

pub use capability::{Entity, JsonQueryable, TemporallyVersioned, VectorSearchable};
pub use config::{RelationalConfig, TemporalConfig, VectorConfig, CONFIG_FILE_NAME};
pub use memory::{Clock, InMemoryStore, ManualClock, SystemClock, DEFAULT_ENGINE_VERSION};
pub use mutate::{load_document, mutate_document, update_row};
