//! Parameterized SQL fragments for MariaDB-backed record stores
//!
//! Builders never interpolate values into SQL text. Identifiers are validated
//! and back-quoted; everything else travels as a bound parameter.

use crate::error::{Error, Result};
use crate::value::Value;

/// Maximum identifier length accepted by MariaDB (table and column names)
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// SQL text with positional `?` placeholders and their bound values
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// SQL text
    pub sql: String,
    /// Bound parameters, in placeholder order
    pub params: Vec<Value>,
}

impl SqlFragment {
    /// Fragment with no parameters
    pub fn new(sql: impl Into<String>) -> Self {
        SqlFragment {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Fragment with parameters
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        SqlFragment {
            sql: sql.into(),
            params,
        }
    }

    /// Join fragments with a keyword (`AND`, `OR`), parenthesizing each part
    pub fn join(parts: Vec<SqlFragment>, keyword: &str) -> SqlFragment {
        let mut sql = String::new();
        let mut params = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(keyword);
                sql.push(' ');
            }
            sql.push('(');
            sql.push_str(&part.sql);
            sql.push(')');
            params.extend(part.params);
        }
        SqlFragment { sql, params }
    }

    /// Number of `?` placeholders in the text
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Validate an identifier (table or column name)
///
/// # Validation Rules
/// - Cannot be empty
/// - Cannot exceed 64 characters
/// - ASCII letters, digits, `_` and `$` only
/// - Cannot start with a digit
pub fn validate_identifier(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidIdentifier {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("identifier cannot be empty");
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return reject("identifier cannot exceed 64 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return reject("identifier may only contain ASCII letters, digits, '_' and '$'");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return reject("identifier cannot start with a digit");
    }
    Ok(())
}

/// Validate and back-quote an identifier
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_valid_identifiers() {
        assert_eq!(quote_identifier("blog_post").unwrap(), "`blog_post`");
        assert_eq!(quote_identifier("row_start").unwrap(), "`row_start`");
    }

    #[test]
    fn test_reject_injection_attempts() {
        for bad in ["", "posts; DROP TABLE x", "a`b", "1table", "na-me", "tab le"] {
            assert!(
                matches!(quote_identifier(bad), Err(Error::InvalidIdentifier { .. })),
                "accepted {:?}",
                bad
            );
        }
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long).is_err());
    }

    #[test]
    fn test_join_preserves_param_order() {
        let a = SqlFragment::with_params("x = ?", vec![Value::Int(1)]);
        let b = SqlFragment::with_params("y = ?", vec![Value::Int(2)]);
        let joined = SqlFragment::join(vec![a, b], "AND");
        assert_eq!(joined.sql, "(x = ?) AND (y = ?)");
        assert_eq!(joined.params, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(joined.placeholder_count(), 2);
    }
}
