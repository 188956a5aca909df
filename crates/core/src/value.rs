//! Column values
//!
//! Rows map column names to [`Value`]s. Besides the usual scalars there is
//! one variant per extension column kind: `Bytes` for packed vectors,
//! `Json` for metadata documents and `Timestamp` for period columns.
//!
//! Equality never coerces across variants (`Int(1) != Float(1.0)`, a JSON
//! string is not a `String`). Floats compare as IEEE-754, so `NaN` is not
//! equal to itself.

use crate::contract::Timestamp;
use serde::{Deserialize, Serialize};

/// One column of a stored row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL `NULL`
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// IEEE-754 double
    Float(f64),
    /// Text; JSON read from a text column arrives as this
    String(String),
    /// Packed vector blob
    Bytes(Vec<u8>),
    /// Parsed JSON document
    Json(serde_json::Value),
    /// Period column
    Timestamp(Timestamp),
}

/// `as_*` accessors that borrow or copy the payload of one variant
macro_rules! accessors {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty, $variant:ident($bind:ident) => $out:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Option<$ty> {
                match self {
                    Value::$variant($bind) => Some($out),
                    _ => None,
                }
            }
        )*
    };
}

impl Value {
    /// Variant name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Json(_) => "Json",
            Value::Timestamp(_) => "Timestamp",
        }
    }

    /// True for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    accessors! {
        /// Payload of `Bool`
        as_bool -> bool, Bool(b) => *b;
        /// Payload of `Int`
        as_int -> i64, Int(i) => *i;
        /// Payload of `String`
        as_str -> &str, String(s) => s.as_str();
        /// Payload of `Bytes`
        as_bytes -> &[u8], Bytes(b) => b.as_slice();
        /// Payload of `Json`
        as_json -> &serde_json::Value, Json(j) => j;
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    String => String,
    bool => Bool,
    i64 => Int,
    f64 => Float,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
    Timestamp => Timestamp,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

/// `None` becomes `Null`
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
