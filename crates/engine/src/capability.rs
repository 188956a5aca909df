//! Capability traits for entity types
//!
//! An entity opts into each extension separately:
//!
//! | Trait | Adds |
//! |-------|------|
//! | [`VectorSearchable`] | similarity search over one vector column |
//! | [`TemporallyVersioned`] | enablement, history and point-in-time reads |
//! | [`JsonQueryable`] | predicates and path extraction over declared JSON columns |
//!
//! All three build on [`Entity`], which names the table and maps the entity
//! to and from a [`Row`]. Stores and controllers are passed in explicitly.

use strata_core::{Error, JsonPath, RecordId, RecordStore, Result, Row, Timestamp};
use strata_json::{build_containment_predicate, build_equality_predicate, extract_at, Predicate};
use strata_temporal::{HistoryRange, TemporalController, TemporalState, VersionedRecord};
use strata_vector::{search_with_options, SearchOptions, SimilarityResult, VectorField};

/// A type stored as rows of one table
pub trait Entity: Sized {
    /// Table holding the entity's rows
    const TABLE: &'static str;

    /// Primary key
    fn id(&self) -> RecordId;

    /// Row to write
    fn to_row(&self) -> Result<Row>;

    /// Rebuild from a stored row
    fn from_row(row: &Row) -> Result<Self>;

    /// Load by primary key
    fn load(store: &dyn RecordStore, id: RecordId) -> Result<Option<Self>> {
        store
            .get(Self::TABLE, id)?
            .map(|row| Self::from_row(&row))
            .transpose()
    }

    /// Load by primary key, failing with `RecordNotFound` when absent
    fn fetch(store: &dyn RecordStore, id: RecordId) -> Result<Self> {
        Self::load(store, id)?.ok_or_else(|| Error::RecordNotFound {
            table: Self::TABLE.to_string(),
            id,
        })
    }

    /// Insert or replace
    fn save(&self, store: &dyn RecordStore) -> Result<()> {
        store.put(Self::TABLE, self.to_row()?)
    }

    /// Every current entity, in primary-key order
    fn all(store: &dyn RecordStore) -> Result<Vec<Self>> {
        store
            .scan(Self::TABLE)?
            .iter()
            .map(Self::from_row)
            .collect()
    }
}

/// Entity with an embedding column
pub trait VectorSearchable: Entity {
    /// The embedding column
    fn vector_field() -> VectorField;

    /// Rank stored rows by similarity to `query`
    ///
    /// Rows whose embedding is `Null` or missing are skipped.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `query` does not match the stored dimension
    /// - `CorruptVector` / `UnsupportedVectorSource` if a stored embedding
    ///   cannot be decoded (the whole search fails)
    fn search_similar(
        store: &dyn RecordStore,
        query: &[f64],
        options: &SearchOptions,
    ) -> Result<Vec<SimilarityResult>> {
        let field = Self::vector_field();
        let rows = store.scan(Self::TABLE)?;
        let candidates = rows
            .iter()
            .map(|row| -> Result<(RecordId, Option<Vec<f64>>)> {
                let vector = match row.get(field.name()) {
                    Some(value) => field.from_value(value)?,
                    None => None,
                };
                Ok((row.id, vector))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            target: "strata::vector",
            table = Self::TABLE,
            field = field.name(),
            candidates = candidates.len(),
            "Similarity search over stored rows"
        );
        search_with_options(query, candidates, options)
    }

    /// Like [`search_similar`](Self::search_similar), returning entities
    fn search_similar_entities(
        store: &dyn RecordStore,
        query: &[f64],
        options: &SearchOptions,
    ) -> Result<Vec<(Self, f64)>> {
        Self::search_similar(store, query, options)?
            .into_iter()
            .map(|hit| -> Result<(Self, f64)> { Ok((Self::fetch(store, hit.id)?, hit.score)) })
            .collect()
    }
}

/// Entity whose table keeps full change history
pub trait TemporallyVersioned: Entity {
    /// Turn on system versioning for the entity's table
    ///
    /// A second call returns `AlreadyEnabled`.
    fn enable_versioning(controller: &TemporalController<'_>) -> Result<TemporalState> {
        controller.enable(Self::TABLE)
    }

    /// Snapshots of the entity with `id`, ordered by interval start
    fn history(
        controller: &TemporalController<'_>,
        store: &dyn RecordStore,
        id: RecordId,
        range: &HistoryRange,
    ) -> Result<Vec<VersionedRecord>> {
        controller.query_history(store, Self::TABLE, id, range)
    }

    /// Entity as it was at `at`
    fn as_of(
        controller: &TemporalController<'_>,
        store: &dyn RecordStore,
        id: RecordId,
        at: Timestamp,
    ) -> Result<Option<Self>> {
        controller
            .as_of(store, Self::TABLE, id, at)?
            .map(|version| Self::from_row(&version.row))
            .transpose()
    }
}

/// Entity with schema-free JSON columns
pub trait JsonQueryable: Entity {
    /// Columns holding JSON documents
    const JSON_FIELDS: &'static [&'static str];

    /// Fail with `UnknownJsonField` unless `field` is declared
    fn check_json_field(field: &str) -> Result<()> {
        if Self::JSON_FIELDS.contains(&field) {
            Ok(())
        } else {
            Err(Error::UnknownJsonField {
                table: Self::TABLE.to_string(),
                field: field.to_string(),
            })
        }
    }

    /// "`field` at dotted `path` equals `value`"
    fn json_equals(
        field: &str,
        path: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<Predicate> {
        Self::check_json_field(field)?;
        build_equality_predicate(field, path, value)
    }

    /// "`field` has top-level `key` containing `value`"
    fn json_contains(
        field: &str,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<Predicate> {
        Self::check_json_field(field)?;
        build_containment_predicate(field, key, value)
    }

    /// Value at dotted `path` of `field` for every row, in primary-key order
    ///
    /// Rows whose document lacks the path (or is unreadable) pair with `None`.
    fn json_extract(
        store: &dyn RecordStore,
        field: &str,
        path: &str,
    ) -> Result<Vec<(RecordId, Option<serde_json::Value>)>> {
        Self::check_json_field(field)?;
        let path: JsonPath = path.parse()?;
        let extracted: Vec<_> = store
            .scan(Self::TABLE)?
            .iter()
            .map(|row| (row.id, extract_at(row, field, &path)))
            .collect();
        tracing::debug!(
            target: "strata::json",
            table = Self::TABLE,
            field,
            path = %path,
            rows = extracted.len(),
            "JSON path extracted"
        );
        Ok(extracted)
    }

    /// Entities matching `predicate`, in primary-key order
    fn filter_json(store: &dyn RecordStore, predicate: &Predicate) -> Result<Vec<Self>> {
        for field in predicate.fields() {
            Self::check_json_field(field)?;
        }
        let rows = store.select(Self::TABLE, predicate)?;
        tracing::debug!(
            target: "strata::json",
            table = Self::TABLE,
            matched = rows.len(),
            "JSON filter applied"
        );
        rows.iter().map(Self::from_row).collect()
    }
}
