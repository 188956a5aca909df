//! Schema-free JSON metadata for relational records
//!
//! This crate provides:
//! - **predicate**: equality and containment predicates over JSON columns,
//!   combinable with and/or/not and evaluable as a `RowFilter`
//! - **sql**: parameterized MariaDB rendering of those predicates and of
//!   path extraction
//! - **document**: `MetadataDocument` with all-or-nothing mutation helpers
//! - **compare**: numeric-aware equality and `JSON_CONTAINS` semantics

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod document;
pub mod predicate;
pub mod sql;

pub use compare::{json_contains, json_equal};
pub use document::{extract_at, stored_document, MetadataDocument};
pub use predicate::{build_containment_predicate, build_equality_predicate, Predicate};
pub use sql::extract_sql;
