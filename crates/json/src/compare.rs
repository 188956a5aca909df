//! JSON value comparison with MariaDB semantics
//!
//! - Numbers compare by numeric value: `1`, `1.0` and `1e0` are equal
//! - Strings, booleans and null compare exactly
//! - Arrays and objects compare element-wise with the same rules
//!
//! Containment follows `JSON_CONTAINS(target, candidate)`:
//! - a scalar candidate is contained in an equal scalar, or in an array
//!   holding an element that contains it
//! - an array candidate is contained in an array if each of its elements is
//! - an object candidate is contained in an object if every key of the
//!   candidate is present in the target and its value contains the
//!   candidate's value

use serde_json::{Number, Value as JsonValue};

/// Equality with numeric normalization
pub fn json_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => numbers_equal(x, y),
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map_or(false, |w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// True if `target` contains `candidate`
pub fn json_contains(target: &JsonValue, candidate: &JsonValue) -> bool {
    match (target, candidate) {
        (JsonValue::Array(t), JsonValue::Array(c)) => c
            .iter()
            .all(|item| t.iter().any(|elem| json_contains(elem, item))),
        (JsonValue::Array(t), c) => t.iter().any(|elem| json_contains(elem, c)),
        (JsonValue::Object(t), JsonValue::Object(c)) => c
            .iter()
            .all(|(k, v)| t.get(k).map_or(false, |tv| json_contains(tv, v))),
        (t, c) => json_equal(t, c),
    }
}
