//! Read-modify-write helpers
//!
//! The closure works on a copy. The row is written back only if the closure
//! succeeds, so a failed mutation leaves the stored row exactly as it was.
//! Isolation against concurrent writers is the store's business.

use strata_core::{Error, RecordId, RecordStore, Result, Row};
use strata_json::MetadataDocument;

/// Apply `f` to the current row `id` of `table` and write it back
///
/// # Errors
///
/// `RecordNotFound` if the row does not exist; otherwise whatever `f` or the
/// store returns.
pub fn update_row<T>(
    store: &dyn RecordStore,
    table: &str,
    id: RecordId,
    f: impl FnOnce(&mut Row) -> Result<T>,
) -> Result<T> {
    let mut row = store
        .get(table, id)?
        .ok_or_else(|| Error::RecordNotFound {
            table: table.to_string(),
            id,
        })?;
    let out = f(&mut row)?;
    // Identity is fixed
    row.id = id;
    store.put(table, row)?;
    Ok(out)
}

/// Apply `f` to the JSON document held in `field` and write it back
///
/// A missing or `Null` column reads as an empty document. The whole
/// document is written back, never a partial patch.
///
/// # Errors
///
/// - `RecordNotFound` if the row does not exist
/// - `InvalidDocument` if the stored value is not a JSON object
/// - whatever `f` returns (nothing is written)
pub fn mutate_document<T>(
    store: &dyn RecordStore,
    table: &str,
    id: RecordId,
    field: &str,
    f: impl FnOnce(&mut MetadataDocument) -> Result<T>,
) -> Result<T> {
    update_row(store, table, id, |row| {
        let mut doc = load_document(row, field)?;
        let out = f(&mut doc)?;
        row.set(field, doc.to_value()?);
        tracing::debug!(
            target: "strata::json",
            table,
            id = id.0,
            field,
            keys = doc.len(),
            "Metadata document updated"
        );
        Ok(out)
    })
}

/// Document held in `field` of `row`; absent reads as empty
pub fn load_document(row: &Row, field: &str) -> Result<MetadataDocument> {
    match row.get(field) {
        Some(value) => MetadataDocument::from_value(value).map_err(|e| {
            tracing::warn!(
                target: "strata::json",
                id = row.id.0,
                field,
                error = %e,
                "Stored metadata is not a JSON object"
            );
            e
        }),
        None => Ok(MetadataDocument::new()),
    }
}
