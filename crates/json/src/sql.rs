//! MariaDB rendering of JSON predicates
//!
//! | Predicate | SQL |
//! |-----------|-----|
//! | equals, number | `JSON_EXTRACT(col, ?) = ?` |
//! | equals, anything else | `JSON_EXTRACT(col, ?) = JSON_EXTRACT(?, '$')` |
//! | contains | `JSON_CONTAINS(col, ?, ?)` |
//! | extract ([`extract_sql`]) | `JSON_EXTRACT(col, ?)` |
//!
//! Strings are bound in their quoted JSON form and compared as JSON, so
//! `"5"` does not match a stored number `5` or `true` a stored boolean.
//!
//! Column names are validated and back-quoted; paths and values are bound
//! parameters. SQL `NULL` from an absent path is folded to false under
//! `NOT`, so rendered and in-process evaluation agree.

use crate::predicate::Predicate;
use serde_json::Value as JsonValue;
use strata_core::{quote_identifier, JsonPath, Result, SqlFragment, Value};

impl Predicate {
    /// Render as a parameterized `WHERE` fragment
    pub fn to_sql(&self) -> Result<SqlFragment> {
        match self {
            Predicate::JsonEquals { field, path, value } => equals_sql(field, path, value),
            Predicate::JsonContains { field, key, value } => {
                let column = quote_identifier(field)?;
                let path = JsonPath::root().key(key.clone()).to_mariadb_path();
                Ok(SqlFragment::with_params(
                    format!("JSON_CONTAINS({column}, ?, ?)"),
                    vec![Value::String(value.to_string()), Value::String(path)],
                ))
            }
            Predicate::And(parts) if parts.is_empty() => Ok(SqlFragment::new("1 = 1")),
            Predicate::Or(parts) if parts.is_empty() => Ok(SqlFragment::new("1 = 0")),
            Predicate::And(parts) => Ok(SqlFragment::join(render_all(parts)?, "AND")),
            Predicate::Or(parts) => Ok(SqlFragment::join(render_all(parts)?, "OR")),
            Predicate::Not(inner) => {
                let inner = inner.to_sql()?;
                Ok(SqlFragment::with_params(
                    format!("NOT COALESCE(({}), 0)", inner.sql),
                    inner.params,
                ))
            }
        }
    }
}

fn render_all(parts: &[Predicate]) -> Result<Vec<SqlFragment>> {
    parts.iter().map(Predicate::to_sql).collect()
}

fn equals_sql(field: &str, path: &JsonPath, value: &JsonValue) -> Result<SqlFragment> {
    let column = quote_identifier(field)?;
    let path = Value::String(path.to_mariadb_path());
    Ok(match value {
        JsonValue::Number(n) => {
            let bound = match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            };
            SqlFragment::with_params(format!("JSON_EXTRACT({column}, ?) = ?"), vec![path, bound])
        }
        other => SqlFragment::with_params(
            format!("JSON_EXTRACT({column}, ?) = JSON_EXTRACT(?, '$')"),
            vec![path, Value::String(other.to_string())],
        ),
    })
}

/// Value at dotted `path` inside `field`, for a select list
///
/// Yields SQL `NULL` for rows where the path is absent.
pub fn extract_sql(field: &str, path: &str) -> Result<SqlFragment> {
    let column = quote_identifier(field)?;
    let path: JsonPath = path.parse()?;
    Ok(SqlFragment::with_params(
        format!("JSON_EXTRACT({column}, ?)"),
        vec![Value::String(path.to_mariadb_path())],
    ))
}
