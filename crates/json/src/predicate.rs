//! Predicates over JSON metadata columns
//!
//! Builders return an opaque [`Predicate`]; nothing is executed here.
//! A predicate can be handed to a record store two ways:
//! - evaluated in-process through the core `RowFilter` trait
//! - rendered to a parameterized MariaDB fragment (see [`crate::sql`])
//!
//! An absent path, a missing column, or stored text that is not valid JSON
//! all evaluate as a non-match rather than an error.

use crate::compare::{json_contains, json_equal};
use crate::document::stored_document;
use serde_json::Value as JsonValue;
use strata_core::{
    get_at_path, validate_identifier, Error, JsonPath, Result, Row, RowFilter,
};

/// Filter over one or more JSON columns
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Document in `field`, at `path`, equals `value`
    JsonEquals {
        /// Column holding the document
        field: String,
        /// Path inside the document
        path: JsonPath,
        /// Expected value
        value: JsonValue,
    },
    /// Top-level `key` of the document in `field` contains `value`
    JsonContains {
        /// Column holding the document
        field: String,
        /// Top-level key
        key: String,
        /// Contained value
        value: JsonValue,
    },
    /// All must match (empty matches everything)
    And(Vec<Predicate>),
    /// Any must match (empty matches nothing)
    Or(Vec<Predicate>),
    /// Negation
    Not(Box<Predicate>),
}

/// "The document in `field`, at dotted `path`, equals `value`"
///
/// Numbers compare numerically; other JSON types compare structurally.
///
/// # Errors
///
/// `InvalidIdentifier` for an unquotable column name, `InvalidPath` for a
/// malformed path.
pub fn build_equality_predicate(
    field: &str,
    path: &str,
    value: impl Into<JsonValue>,
) -> Result<Predicate> {
    validate_identifier(field)?;
    let path: JsonPath = path.parse()?;
    Ok(Predicate::JsonEquals {
        field: field.to_string(),
        path,
        value: value.into(),
    })
}

/// "The document in `field` has top-level `key` containing `value`"
///
/// The key's value either equals `value` or is an array containing it (every
/// element of it, when `value` is itself an array).
pub fn build_containment_predicate(
    field: &str,
    key: &str,
    value: impl Into<JsonValue>,
) -> Result<Predicate> {
    validate_identifier(field)?;
    if key.is_empty() {
        return Err(Error::InvalidDocument("containment key cannot be empty".to_string()));
    }
    Ok(Predicate::JsonContains {
        field: field.to_string(),
        key: key.to_string(),
        value: value.into(),
    })
}

impl Predicate {
    /// Both must match
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Either must match
    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// Negate
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Columns the predicate reads, in first-use order
    pub fn fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::JsonEquals { field, .. } | Predicate::JsonContains { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Predicate::And(parts) | Predicate::Or(parts) => {
                for p in parts {
                    p.collect_fields(out);
                }
            }
            Predicate::Not(inner) => inner.collect_fields(out),
        }
    }

    /// Evaluate against a row
    pub fn evaluate(&self, row: &Row) -> bool {
        match self {
            Predicate::JsonEquals { field, path, value } => row
                .get(field)
                .and_then(stored_document)
                .map_or(false, |doc| {
                    get_at_path(&doc, path).map_or(false, |found| json_equal(found, value))
                }),
            Predicate::JsonContains { field, key, value } => row
                .get(field)
                .and_then(stored_document)
                .map_or(false, |doc| {
                    doc.get(key.as_str())
                        .map_or(false, |found| json_contains(found, value))
                }),
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(row)),
            Predicate::Or(parts) => parts.iter().any(|p| p.evaluate(row)),
            Predicate::Not(inner) => !inner.evaluate(row),
        }
    }
}

impl RowFilter for Predicate {
    fn matches(&self, row: &Row) -> bool {
        self.evaluate(row)
    }
}
