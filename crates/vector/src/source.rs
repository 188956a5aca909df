//! External vector representations
//!
//! Vectors reach the codec from several places: raw column bytes, JSON arrays
//! in fixtures and API payloads, or typed slices from application code.
//! [`VectorSource`] names each accepted shape explicitly; anything else is
//! rejected with `UnsupportedVectorSource`.

use crate::codec;
use serde_json::Value as JsonValue;
use strata_core::{Error, Result, Value};

/// Tagged external representation of a vector
#[derive(Debug, Clone, PartialEq)]
pub enum VectorSource {
    /// Already-typed elements
    Typed(Vec<f64>),
    /// JSON array of numbers
    List(JsonValue),
    /// JSON text of a numeric list (fixture form)
    Text(String),
    /// Stored column bytes
    Bytes(Vec<u8>),
}

impl VectorSource {
    /// Classify a store attribute
    ///
    /// Returns `Ok(None)` for `Null` (the vector is absent).
    pub fn from_value(value: &Value) -> Result<Option<VectorSource>> {
        match value {
            Value::Null => Ok(None),
            Value::Bytes(b) => Ok(Some(VectorSource::Bytes(b.clone()))),
            Value::Json(j) => Ok(Some(VectorSource::List(j.clone()))),
            Value::String(s) => Ok(Some(VectorSource::Text(s.clone()))),
            other => Err(Error::UnsupportedVectorSource {
                kind: format!("{} attribute", other.type_name()),
            }),
        }
    }

    /// Short description used in errors and logs
    pub fn kind(&self) -> &'static str {
        match self {
            VectorSource::Typed(_) => "typed",
            VectorSource::List(_) => "list",
            VectorSource::Text(_) => "text",
            VectorSource::Bytes(_) => "bytes",
        }
    }
}

impl From<Vec<f64>> for VectorSource {
    fn from(v: Vec<f64>) -> Self {
        VectorSource::Typed(v)
    }
}

impl From<Vec<u8>> for VectorSource {
    fn from(b: Vec<u8>) -> Self {
        VectorSource::Bytes(b)
    }
}

/// Decode any accepted representation into a vector of `dimension` elements
///
/// # Errors
///
/// - `UnsupportedVectorSource` for a non-array list, a non-numeric element or
///   unparsable text
/// - `DimensionMismatch` when the element count differs from `dimension`
/// - `CorruptVector` when a byte payload has the wrong length
pub fn decode_from_external_representation(
    source: VectorSource,
    dimension: usize,
) -> Result<Vec<f64>> {
    match source {
        VectorSource::Typed(v) => {
            codec::check_dimension(&v, dimension)?;
            Ok(v)
        }
        VectorSource::List(json) => list_to_vector(&json, dimension),
        VectorSource::Text(text) => {
            let json: JsonValue =
                serde_json::from_str(&text).map_err(|e| Error::UnsupportedVectorSource {
                    kind: format!("unparsable text ({})", e),
                })?;
            list_to_vector(&json, dimension)
        }
        VectorSource::Bytes(bytes) => codec::decode(&bytes, dimension),
    }
}

fn list_to_vector(json: &JsonValue, dimension: usize) -> Result<Vec<f64>> {
    let items = json
        .as_array()
        .ok_or_else(|| Error::UnsupportedVectorSource {
            kind: format!("json {}", strata_core::json::value_type_name(json)),
        })?;
    let vector = items
        .iter()
        .map(|item| {
            item.as_f64().ok_or_else(|| Error::UnsupportedVectorSource {
                kind: format!(
                    "list element of type {}",
                    strata_core::json::value_type_name(item)
                ),
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    codec::check_dimension(&vector, dimension)?;
    Ok(vector)
}

/// Column descriptor for a fixed-dimension vector attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorField {
    name: String,
    dimension: usize,
}

impl VectorField {
    /// Describe a vector column
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        VectorField {
            name: name.into(),
            dimension,
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Byte width of the column
    pub fn max_length(&self) -> usize {
        codec::encoded_len(self.dimension)
    }

    /// Attribute value to store; `None` becomes `Null`
    pub fn to_value(&self, vector: Option<&[f64]>) -> Result<Value> {
        match vector {
            None => Ok(Value::Null),
            Some(v) => Ok(Value::Bytes(codec::encode(v, self.dimension)?)),
        }
    }

    /// Vector held by a stored attribute; `Null` is absent
    pub fn from_value(&self, value: &Value) -> Result<Option<Vec<f64>>> {
        let Some(source) = VectorSource::from_value(value)? else {
            return Ok(None);
        };
        let kind = source.kind();
        decode_from_external_representation(source, self.dimension)
            .map(Some)
            .map_err(|e| {
                tracing::warn!(
                    target: "strata::vector",
                    field = %self.name,
                    source = kind,
                    error = %e,
                    "Stored vector failed to decode"
                );
                e
            })
    }

    /// JSON-list text of the stored vector (fixture form); `None` if absent
    pub fn value_to_string(&self, value: &Value) -> Result<Option<String>> {
        match self.from_value(value)? {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json::to_string(&v)?)),
        }
    }
}
