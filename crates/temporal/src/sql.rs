//! MariaDB statements for system-versioned tables
//!
//! Used by SQL-backed catalog and store implementations. The DDL is
//! unconditional: idempotence comes from the controller checking
//! [`is_versioned_sql`] first, not from `IF NOT EXISTS` guards.

use crate::history::HistoryRange;
use strata_core::{
    quote_identifier, Error, PeriodColumns, RecordId, Result, SqlFragment, Timestamp, Value,
};

/// `SELECT VERSION()`
pub fn version_sql() -> SqlFragment {
    SqlFragment::new("SELECT VERSION()")
}

/// Catalog lookup: one row with `SYSTEM VERSIONED` if the table is versioned
pub fn is_versioned_sql(table: &str) -> Result<SqlFragment> {
    strata_core::validate_identifier(table)?;
    Ok(SqlFragment::with_params(
        "SELECT TABLE_TYPE FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND TABLE_TYPE = 'SYSTEM VERSIONED'",
        vec![Value::String(table.to_string())],
    ))
}

/// Add the period columns and turn on system versioning
pub fn enable_versioning_sql(table: &str, columns: &PeriodColumns) -> Result<SqlFragment> {
    let table = quote_identifier(table)?;
    let start = quote_identifier(&columns.start)?;
    let end = quote_identifier(&columns.end)?;
    Ok(SqlFragment::new(format!(
        "ALTER TABLE {table} \
         ADD COLUMN {start} TIMESTAMP(6) GENERATED ALWAYS AS ROW START, \
         ADD COLUMN {end} TIMESTAMP(6) GENERATED ALWAYS AS ROW END, \
         ADD PERIOD FOR SYSTEM_TIME({start}, {end}), \
         ADD SYSTEM VERSIONING"
    )))
}

/// All versions of one record, ordered by interval start
pub fn history_sql(
    table: &str,
    id_column: &str,
    id: RecordId,
    range: &HistoryRange,
    columns: &PeriodColumns,
) -> Result<SqlFragment> {
    let table = quote_identifier(table)?;
    let id_column = quote_identifier(id_column)?;
    let start_col = quote_identifier(&columns.start)?;
    let end_col = quote_identifier(&columns.end)?;

    let mut sql = format!("SELECT * FROM {table} FOR SYSTEM_TIME ALL WHERE {id_column} = ?");
    let mut params = vec![id_param(id)?];
    if let Some(start) = range.start {
        sql.push_str(&format!(" AND {end_col} >= ?"));
        params.push(period_param(start));
    }
    if let Some(end) = range.end {
        sql.push_str(&format!(" AND {start_col} <= ?"));
        params.push(period_param(end));
    }
    sql.push_str(&format!(" ORDER BY {start_col} ASC"));
    Ok(SqlFragment::with_params(sql, params))
}

/// Table contents as they were at `at`
pub fn as_of_sql(table: &str, at: Timestamp) -> Result<SqlFragment> {
    let table = quote_identifier(table)?;
    Ok(SqlFragment::with_params(
        format!("SELECT * FROM {table} FOR SYSTEM_TIME AS OF TIMESTAMP ?"),
        vec![period_param(at)],
    ))
}

/// Period bounds go over the wire as `TIMESTAMP(6)` text, so the open
/// sentinel lands on the largest value a period column holds
fn period_param(at: Timestamp) -> Value {
    Value::String(at.to_sql_literal())
}

fn id_param(id: RecordId) -> Result<Value> {
    i64::try_from(id.0)
        .map(Value::Int)
        .map_err(|_| Error::Store(format!("record id {} exceeds BIGINT range", id)))
}
