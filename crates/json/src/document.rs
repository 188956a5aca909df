//! Metadata documents attached to records
//!
//! A [`MetadataDocument`] is always a JSON object. Every mutation works on a
//! copy and only replaces the document when it succeeded, so a failed
//! mutation leaves the document exactly as it was. Serialization checks the
//! document limits before anything is handed back to the store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use strata_core::json::value_type_name;
use strata_core::{
    delete_at_path, get_at_path, set_at_path, validate_document, Error, JsonPath, Result, Row,
    Value,
};

/// Moderation flag key
pub const FLAGGED_KEY: &str = "flagged";
/// Moderation reason key
pub const FLAG_REASON_KEY: &str = "flag_reason";
/// Moderation timestamp key
pub const FLAGGED_AT_KEY: &str = "flagged_at";

/// JSON document held by a stored attribute, parsing text columns on demand
///
/// `None` for `Null`, non-JSON attributes and unparsable text.
pub fn stored_document(value: &Value) -> Option<Cow<'_, JsonValue>> {
    match value {
        Value::Json(j) => Some(Cow::Borrowed(j)),
        Value::String(s) => match serde_json::from_str(s) {
            Ok(parsed) => Some(Cow::Owned(parsed)),
            Err(e) => {
                tracing::trace!(target: "strata::json", error = %e, "Stored text is not JSON");
                None
            }
        },
        Value::Null => None,
        other => {
            tracing::trace!(
                target: "strata::json",
                kind = other.type_name(),
                "Column cannot hold a JSON document"
            );
            None
        }
    }
}

/// Value at `path` inside the document held by `row.field`
///
/// `None` when the column is missing, unreadable or lacks the path, the same
/// rows for which `JSON_EXTRACT` yields `NULL`.
pub fn extract_at(row: &Row, field: &str, path: &JsonPath) -> Option<JsonValue> {
    let doc = stored_document(row.get(field)?)?;
    get_at_path(&doc, path).cloned()
}

/// Schema-free JSON object attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    root: JsonValue,
}

impl MetadataDocument {
    /// Empty document (`{}`)
    pub fn new() -> Self {
        MetadataDocument {
            root: JsonValue::Object(Map::new()),
        }
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_json(json: JsonValue) -> Result<Self> {
        if !json.is_object() {
            return Err(Error::InvalidDocument(format!(
                "metadata must be an object, found {}",
                value_type_name(&json)
            )));
        }
        validate_document(&json)?;
        Ok(MetadataDocument { root: json })
    }

    /// Parse JSON text holding an object
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(text)?)
    }

    /// Load from a stored attribute
    ///
    /// `Null` loads as an empty document. Anything that is not a JSON object
    /// (or text holding one) is `InvalidDocument`; it is never reset silently.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Json(j) => Self::from_json(j.clone()),
            Value::String(s) => Self::parse(s),
            other => Err(Error::InvalidDocument(format!(
                "cannot load metadata from {} attribute",
                other.type_name()
            ))),
        }
    }

    /// The document as JSON
    pub fn as_json(&self) -> &JsonValue {
        &self.root
    }

    /// Consume into JSON
    pub fn into_json(self) -> JsonValue {
        self.root
    }

    /// Value at a dotted path
    pub fn get(&self, path: &str) -> Result<Option<&JsonValue>> {
        let path: JsonPath = path.parse()?;
        Ok(get_at_path(&self.root, &path))
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.root.as_object().map_or(0, Map::len)
    }

    /// True if there are no top-level keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `f` to a copy and keep it only if `f` succeeds and the result
    /// is still a valid object within limits
    fn apply<T>(&mut self, f: impl FnOnce(&mut JsonValue) -> Result<T>) -> Result<T> {
        let mut next = self.root.clone();
        let out = f(&mut next)?;
        if !next.is_object() {
            return Err(Error::InvalidDocument(
                "mutation would replace the metadata object".to_string(),
            ));
        }
        validate_document(&next)?;
        self.root = next;
        Ok(out)
    }

    /// Set the value at `path`, creating intermediate objects
    pub fn set(&mut self, path: &str, value: impl Into<JsonValue>) -> Result<()> {
        let path = non_root_path(path)?;
        let value = value.into();
        self.apply(|doc| Ok(set_at_path(doc, &path, value)?))
    }

    /// Append `item` to the array at `key` unless an equal item is present
    ///
    /// A missing key starts a new array. Returns whether the item was added.
    pub fn append_unique(&mut self, key: &str, item: impl Into<JsonValue>) -> Result<bool> {
        let path = non_root_path(key)?;
        let item = item.into();
        self.apply(|doc| {
            match get_at_path(doc, &path) {
                None | Some(JsonValue::Null) => {
                    set_at_path(doc, &path, JsonValue::Array(vec![item]))?;
                    return Ok(true);
                }
                Some(JsonValue::Array(items)) => {
                    if items.iter().any(|x| crate::compare::json_equal(x, &item)) {
                        return Ok(false);
                    }
                }
                Some(other) => {
                    return Err(Error::InvalidDocument(format!(
                        "cannot append to {} at '{}'",
                        value_type_name(other),
                        path
                    )))
                }
            }
            if let Some(JsonValue::Array(items)) = get_at_path_mut(doc, &path) {
                items.push(item);
            }
            Ok(true)
        })
    }

    /// Add `amount` to the number at `path` (missing counts as 0)
    ///
    /// Integer counters stay integers; a float counter is added as float.
    /// Returns the new value.
    pub fn increment(&mut self, path: &str, amount: i64) -> Result<JsonValue> {
        let path = non_root_path(path)?;
        self.apply(|doc| {
            let next = match get_at_path(doc, &path) {
                None | Some(JsonValue::Null) => JsonValue::from(amount),
                Some(JsonValue::Number(n)) => match n.as_i64() {
                    Some(current) => {
                        let sum = current.checked_add(amount).ok_or_else(|| {
                            Error::InvalidDocument(format!("counter overflow at '{}'", path))
                        })?;
                        JsonValue::from(sum)
                    }
                    None => {
                        let current = n.as_f64().unwrap_or(0.0);
                        serde_json::Number::from_f64(current + amount as f64)
                            .map(JsonValue::Number)
                            .ok_or_else(|| {
                                Error::InvalidDocument(format!("non-finite counter at '{}'", path))
                            })?
                    }
                },
                Some(other) => {
                    return Err(Error::InvalidDocument(format!(
                        "cannot increment {} at '{}'",
                        value_type_name(other),
                        path
                    )))
                }
            };
            set_at_path(doc, &path, next.clone())?;
            Ok(next)
        })
    }

    /// Remove the value at `path`, returning it if present
    pub fn remove(&mut self, path: &str) -> Result<Option<JsonValue>> {
        let path = non_root_path(path)?;
        self.apply(|doc| Ok(delete_at_path(doc, &path)?))
    }

    /// Mark for moderation: `flagged`, `flag_reason`, `flagged_at` (RFC 3339)
    pub fn flag(&mut self, reason: &str, at: DateTime<Utc>) -> Result<()> {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Micros, true);
        self.apply(|doc| {
            let obj = doc
                .as_object_mut()
                .ok_or_else(|| Error::InvalidDocument("metadata is not an object".to_string()))?;
            obj.insert(FLAGGED_KEY.to_string(), JsonValue::Bool(true));
            obj.insert(FLAG_REASON_KEY.to_string(), JsonValue::from(reason));
            obj.insert(FLAGGED_AT_KEY.to_string(), JsonValue::from(stamp));
            Ok(())
        })
    }

    /// True if the moderation flag is set
    pub fn is_flagged(&self) -> bool {
        self.root
            .get(FLAGGED_KEY)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Compact JSON text, limits checked
    pub fn to_json_string(&self) -> Result<String> {
        validate_document(&self.root)?;
        Ok(serde_json::to_string(&self.root)?)
    }

    /// Attribute value to store, limits checked
    pub fn to_value(&self) -> Result<Value> {
        validate_document(&self.root)?;
        Ok(Value::Json(self.root.clone()))
    }
}

fn non_root_path(path: &str) -> Result<JsonPath> {
    let parsed: JsonPath = path.parse()?;
    if parsed.is_root() {
        return Err(Error::InvalidDocument(
            "path must name a key inside the metadata object".to_string(),
        ));
    }
    Ok(parsed)
}

fn get_at_path_mut<'a>(value: &'a mut JsonValue, path: &JsonPath) -> Option<&'a mut JsonValue> {
    let mut current = value;
    for segment in path.segments() {
        current = match (segment, current) {
            (strata_core::PathSegment::Key(k), JsonValue::Object(obj)) => obj.get_mut(k)?,
            (strata_core::PathSegment::Index(i), JsonValue::Array(arr)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

impl Default for MetadataDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<JsonValue> for MetadataDocument {
    type Error = Error;

    fn try_from(json: JsonValue) -> Result<Self> {
        Self::from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_append_unique_no_duplicates() {
        let mut doc = MetadataDocument::from_json(json!({"tags": ["a"]})).unwrap();
        assert!(doc.append_unique("tags", "b").unwrap());
        assert!(!doc.append_unique("tags", "b").unwrap());
        assert_eq!(doc.as_json(), &json!({"tags": ["a", "b"]}));
        assert_eq!(doc.to_json_string().unwrap(), r#"{"tags":["a","b"]}"#);
    }

    #[test]
    fn test_append_unique_creates_array() {
        let mut doc = MetadataDocument::new();
        doc.append_unique("tags", "rust").unwrap();
        assert_eq!(doc.as_json(), &json!({"tags": ["rust"]}));
    }

    #[test]
    fn test_append_to_non_array_leaves_document_unchanged() {
        let mut doc = MetadataDocument::from_json(json!({"tags": "a"})).unwrap();
        let before = doc.clone();
        assert!(matches!(
            doc.append_unique("tags", "b"),
            Err(Error::InvalidDocument(_))
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_set_nested_path() {
        let mut doc = MetadataDocument::from_json(json!({"category": "Guide"})).unwrap();
        doc.set("category", "Tutorial").unwrap();
        doc.set("seo.keywords", json!(["mariadb"])).unwrap();
        assert_eq!(
            doc.as_json(),
            &json!({"category": "Tutorial", "seo": {"keywords": ["mariadb"]}})
        );
        assert_eq!(doc.get("seo.keywords[0]").unwrap(), Some(&json!("mariadb")));
    }

    #[test]
    fn test_set_through_scalar_fails_cleanly() {
        let mut doc = MetadataDocument::from_json(json!({"seo": "x"})).unwrap();
        assert!(doc.set("seo.keywords", json!([])).is_err());
        assert_eq!(doc.as_json(), &json!({"seo": "x"}));
    }

    #[test]
    fn test_root_path_rejected() {
        let mut doc = MetadataDocument::new();
        assert!(matches!(doc.set("", 1), Err(Error::InvalidDocument(_))));
        assert!(matches!(doc.set("a..b", 1), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_increment_counters() {
        let mut doc = MetadataDocument::new();
        assert_eq!(doc.increment("metrics.views", 1).unwrap(), json!(1));
        assert_eq!(doc.increment("metrics.views", 2).unwrap(), json!(3));
        assert_eq!(doc.as_json(), &json!({"metrics": {"views": 3}}));

        let mut doc = MetadataDocument::from_json(json!({"score": 1.5})).unwrap();
        assert_eq!(doc.increment("score", 1).unwrap(), json!(2.5));

        let mut doc = MetadataDocument::from_json(json!({"views": "many"})).unwrap();
        assert!(doc.increment("views", 1).is_err());
        assert_eq!(doc.as_json(), &json!({"views": "many"}));
    }

    #[test]
    fn test_remove() {
        let mut doc = MetadataDocument::from_json(json!({"a": 1, "b": {"c": 2}})).unwrap();
        assert_eq!(doc.remove("b.c").unwrap(), Some(json!(2)));
        assert_eq!(doc.remove("missing").unwrap(), None);
        assert_eq!(doc.as_json(), &json!({"a": 1, "b": {}}));
    }

    #[test]
    fn test_flag_for_moderation() {
        let mut doc = MetadataDocument::new();
        assert!(!doc.is_flagged());
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        doc.flag("spam", at).unwrap();
        assert!(doc.is_flagged());
        assert_eq!(doc.get("flag_reason").unwrap(), Some(&json!("spam")));
        assert_eq!(
            doc.get("flagged_at").unwrap(),
            Some(&json!("2024-03-01T12:00:00.000000Z"))
        );
    }

    #[test]
    fn test_from_value_shapes() {
        assert!(MetadataDocument::from_value(&Value::Null).unwrap().is_empty());

        let doc = MetadataDocument::from_value(&Value::String(r#"{"a": 1}"#.into())).unwrap();
        assert_eq!(doc.len(), 1);

        let doc = MetadataDocument::from_value(&Value::Json(json!({"b": true}))).unwrap();
        assert_eq!(doc.get("b").unwrap(), Some(&json!(true)));

        for bad in [
            Value::String("{broken".into()),
            Value::Json(json!([1, 2])),
            Value::Int(3),
        ] {
            assert!(matches!(
                MetadataDocument::from_value(&bad),
                Err(Error::InvalidDocument(_))
            ));
        }
    }

    #[test]
    fn test_extract_at() {
        let path: JsonPath = "seo.keywords[1]".parse().unwrap();
        let row = Row::new(1).with("metadata", json!({"seo": {"keywords": ["db", "orm"]}}));
        assert_eq!(extract_at(&row, "metadata", &path), Some(json!("orm")));
        assert_eq!(extract_at(&row, "other", &path), None);

        let text = Row::new(2).with("metadata", r#"{"seo": {"keywords": ["a", "b"]}}"#);
        assert_eq!(extract_at(&text, "metadata", &path), Some(json!("b")));
        let broken = Row::new(3).with("metadata", "{oops");
        assert_eq!(extract_at(&broken, "metadata", &path), None);
    }

    #[test]
    fn test_stored_document() {
        assert_eq!(
            stored_document(&Value::String(r#"{"x":1}"#.into())).as_deref(),
            Some(&json!({"x": 1}))
        );
        assert!(stored_document(&Value::String("nope".into())).is_none());
        assert!(stored_document(&Value::Null).is_none());
    }

    #[test]
    fn test_to_value_round_trip() {
        let doc = MetadataDocument::from_json(json!({"k": [1, 2]})).unwrap();
        let stored = doc.to_value().unwrap();
        assert_eq!(MetadataDocument::from_value(&stored).unwrap(), doc);
    }
}
