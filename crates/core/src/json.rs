//! Paths into metadata documents
//!
//! A [`JsonPath`] is what the predicate builder resolves against stored
//! documents and what the mutation helpers write through. Paths use the
//! dotted form applications already pass around (`seo.keywords[0]`) and can
//! be rendered as MariaDB path expressions (`$.seo.keywords[0]`).
//!
//! Documents written back by the extension layer are bounded:
//!
//! | Bound | Value |
//! |-------|-------|
//! | [`MAX_DOCUMENT_SIZE`] | 16 MiB of serialized JSON |
//! | [`MAX_NESTING_DEPTH`] | 100 container levels |
//! | [`MAX_ARRAY_SIZE`] | 1,000,000 elements in any one array |
//! | [`MAX_PATH_LENGTH`] | 256 segments per path |

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};
use thiserror::Error;

/// Serialized document bound in bytes
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Container nesting bound
pub const MAX_NESTING_DEPTH: usize = 100;

/// Segments allowed in one path
pub const MAX_PATH_LENGTH: usize = 256;

/// Elements allowed in one array
pub const MAX_ARRAY_SIZE: usize = 1_000_000;

/// A document outgrew one of the bounds
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Serialized form is too large
    #[error("document is {size} bytes, limit is {max}")]
    DocumentTooLarge {
        /// Serialized size
        size: usize,
        /// Bound
        max: usize,
    },

    /// Containers nest too deeply
    #[error("document nests {depth} levels deep, limit is {max}")]
    NestingTooDeep {
        /// Deepest nesting found
        depth: usize,
        /// Bound
        max: usize,
    },

    /// Some array is too long
    #[error("array holds {size} elements, limit is {max}")]
    ArrayTooLarge {
        /// Longest array found
        size: usize,
        /// Bound
        max: usize,
    },
}

/// Check a document against every bound
///
/// The structural walk runs first; serialization only happens for
/// documents that pass it.
pub fn validate_document(value: &JsonValue) -> Result<(), LimitError> {
    let shape = Shape::of(value);
    if shape.depth > MAX_NESTING_DEPTH {
        return Err(LimitError::NestingTooDeep {
            depth: shape.depth,
            max: MAX_NESTING_DEPTH,
        });
    }
    if shape.widest_array > MAX_ARRAY_SIZE {
        return Err(LimitError::ArrayTooLarge {
            size: shape.widest_array,
            max: MAX_ARRAY_SIZE,
        });
    }
    let size = value.to_string().len();
    if size > MAX_DOCUMENT_SIZE {
        return Err(LimitError::DocumentTooLarge {
            size,
            max: MAX_DOCUMENT_SIZE,
        });
    }
    Ok(())
}

/// Depth and widest array of a document, in one walk
#[derive(Default)]
struct Shape {
    depth: usize,
    widest_array: usize,
}

impl Shape {
    fn of(value: &JsonValue) -> Shape {
        let mut shape = match value {
            JsonValue::Array(items) => Shape::over(items.iter()),
            JsonValue::Object(map) => Shape::over(map.values()),
            _ => return Shape::default(),
        };
        shape.widest_array = shape.widest_array.max(value.as_array().map_or(0, Vec::len));
        shape
    }

    fn over<'a>(children: impl Iterator<Item = &'a JsonValue>) -> Shape {
        children.map(Shape::of).fold(
            Shape {
                depth: 1,
                widest_array: 0,
            },
            |acc, child| Shape {
                depth: acc.depth.max(child.depth + 1),
                widest_array: acc.widest_array.max(child.widest_array),
            },
        )
    }
}

/// Name of a JSON type, for error messages
pub fn value_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Malformed path text; positions are byte offsets
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// A `.` with no key after it
    #[error("empty key at offset {0}")]
    EmptyKey(usize),
    /// `[` without a matching `]`
    #[error("'[' at offset {0} is never closed")]
    UnclosedBracket(usize),
    /// Bracket contents are not a non-negative integer
    #[error("bad array index '{1}' at offset {0}")]
    InvalidIndex(usize, String),
    /// Character that cannot start a segment
    #[error("unexpected '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    /// More than [`MAX_PATH_LENGTH`] segments
    #[error("path has {0} segments, maximum is {MAX_PATH_LENGTH}")]
    TooLong(usize),
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(n) => write!(f, "[{n}]"),
        }
    }
}

/// Location inside a JSON document
///
/// The empty path is the document itself.
///
/// ```
/// use strata_core::json::JsonPath;
///
/// let path: JsonPath = "seo.keywords".parse().unwrap();
/// assert_eq!(path, JsonPath::root().key("seo").key("keywords"));
/// assert_eq!(path.to_mariadb_path(), "$.seo.keywords");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    /// The whole document
    pub fn root() -> Self {
        JsonPath(Vec::new())
    }

    /// Extend with an object member
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Extend with an array element
    pub fn index(mut self, n: usize) -> Self {
        self.0.push(PathSegment::Index(n));
        self
    }

    /// Steps from the root
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the root path
    pub fn is_root(&self) -> bool {
        self.is_empty()
    }

    /// MariaDB path expression; keys that are not plain words are quoted
    pub fn to_mariadb_path(&self) -> String {
        self.0.iter().fold(String::from("$"), |mut out, segment| {
            match segment {
                PathSegment::Key(key) if is_plain_word(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                PathSegment::Key(key) => {
                    let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
                    out.push_str(&format!(".\"{escaped}\""));
                }
                PathSegment::Index(n) => out.push_str(&format!("[{n}]")),
            }
            out
        })
    }
}

fn is_plain_word(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Grammar: `[.]seg(.key | [n])*` where `seg` is a key or `[n]`
impl FromStr for JsonPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.char_indices().peekable();
        let mut segments = Vec::new();

        if let Some(&(_, '.')) = chars.peek() {
            chars.next();
            if chars.peek().is_none() {
                return Err(PathParseError::EmptyKey(1));
            }
        }

        while let Some(&(at, c)) = chars.peek() {
            match c {
                '[' => segments.push(parse_index(s, &mut chars)?),
                '.' if segments.is_empty() => return Err(PathParseError::EmptyKey(at)),
                '.' => {
                    chars.next();
                    match chars.peek() {
                        Some(&(_, next)) if is_key_char(next) => {}
                        _ => return Err(PathParseError::EmptyKey(at + 1)),
                    }
                }
                c if is_key_char(c) => {
                    let mut key = String::new();
                    while let Some(&(_, k)) = chars.peek() {
                        if !is_key_char(k) {
                            break;
                        }
                        key.push(k);
                        chars.next();
                    }
                    segments.push(PathSegment::Key(key));
                }
                other => return Err(PathParseError::UnexpectedChar(other, at)),
            }
        }

        if segments.len() > MAX_PATH_LENGTH {
            return Err(PathParseError::TooLong(segments.len()));
        }
        Ok(JsonPath(segments))
    }
}

fn parse_index(
    source: &str,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<PathSegment, PathParseError> {
    let Some((open, _)) = chars.next() else {
        return Err(PathParseError::UnclosedBracket(source.len()));
    };
    let digits_start = open + 1;
    for (at, c) in chars.by_ref() {
        if c == ']' {
            let digits = &source[digits_start..at];
            return digits
                .parse::<usize>()
                .map(PathSegment::Index)
                .map_err(|_| PathParseError::InvalidIndex(digits_start, digits.to_string()));
        }
    }
    Err(PathParseError::UnclosedBracket(open))
}

impl TryFrom<String> for JsonPath {
    type Error = PathParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<JsonPath> for String {
    fn from(path: JsonPath) -> String {
        path.to_string()
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// Path could not be followed for a write
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    /// A segment met the wrong kind of container
    #[error("expected {expected} but found {found}")]
    TypeMismatch {
        /// Container the segment needs
        expected: &'static str,
        /// What was there
        found: &'static str,
    },

    /// Index past the end of an array (appending at `len` is allowed)
    #[error("index {index} is past the end of an array of {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Array length
        len: usize,
    },
}

/// Value at `path`; `None` when a step is missing or meets the wrong type
pub fn get_at_path<'a>(value: &'a JsonValue, path: &JsonPath) -> Option<&'a JsonValue> {
    path.segments()
        .iter()
        .try_fold(value, |node, segment| match (segment, node) {
            (PathSegment::Key(key), JsonValue::Object(map)) => map.get(key),
            (PathSegment::Index(n), JsonValue::Array(items)) => items.get(*n),
            _ => None,
        })
}

/// Step into `node` for a write, creating the child if it is missing
///
/// A missing child becomes an object or array depending on what `next`
/// needs.
fn step_mut<'a>(
    node: &'a mut JsonValue,
    segment: &PathSegment,
    next: &PathSegment,
) -> Result<&'a mut JsonValue, JsonPathError> {
    let found = value_type_name(node);
    match (segment, node) {
        (PathSegment::Key(key), JsonValue::Object(map)) => {
            Ok(map.entry(key.clone()).or_insert_with(|| empty_container_for(next)))
        }
        (PathSegment::Index(n), JsonValue::Array(items)) => {
            let len = items.len();
            items
                .get_mut(*n)
                .ok_or(JsonPathError::IndexOutOfBounds { index: *n, len })
        }
        (PathSegment::Key(_), _) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found,
        }),
        (PathSegment::Index(_), _) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found,
        }),
    }
}

fn empty_container_for(segment: &PathSegment) -> JsonValue {
    match segment {
        PathSegment::Key(_) => JsonValue::Object(serde_json::Map::new()),
        PathSegment::Index(_) => JsonValue::Array(Vec::new()),
    }
}

/// Write `value` at `path`, creating missing intermediate containers
///
/// An index may replace an existing element or append at `len`. Setting the
/// root replaces the whole document. On error the document may have gained
/// empty intermediate containers; callers that need all-or-nothing work on
/// a copy.
pub fn set_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
    value: JsonValue,
) -> Result<(), JsonPathError> {
    let segments = path.segments();
    let Some((last, _)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for pair in segments.windows(2) {
        node = step_mut(node, &pair[0], &pair[1])?;
    }

    let found = value_type_name(node);
    match (last, node) {
        (PathSegment::Key(key), JsonValue::Object(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(n), JsonValue::Array(items)) => match (*n).cmp(&items.len()) {
            std::cmp::Ordering::Less => {
                items[*n] = value;
                Ok(())
            }
            std::cmp::Ordering::Equal => {
                items.push(value);
                Ok(())
            }
            std::cmp::Ordering::Greater => Err(JsonPathError::IndexOutOfBounds {
                index: *n,
                len: items.len(),
            }),
        },
        (PathSegment::Key(_), _) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found,
        }),
        (PathSegment::Index(_), _) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found,
        }),
    }
}

/// Remove the value at `path` and return it
///
/// A missing step is not an error (`Ok(None)`); a final step that meets the
/// wrong container type is. Removing the root leaves `null` behind.
pub fn delete_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
) -> Result<Option<JsonValue>, JsonPathError> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Ok(Some(root.take()));
    };

    let mut node = root;
    for segment in parents {
        let child = match (segment, node) {
            (PathSegment::Key(key), JsonValue::Object(map)) => map.get_mut(key),
            (PathSegment::Index(n), JsonValue::Array(items)) => items.get_mut(*n),
            _ => None,
        };
        match child {
            Some(child) => node = child,
            None => return Ok(None),
        }
    }

    match (last, node) {
        (PathSegment::Key(key), JsonValue::Object(map)) => Ok(map.remove(key)),
        (PathSegment::Index(n), JsonValue::Array(items)) => {
            Ok((*n < items.len()).then(|| items.remove(*n)))
        }
        (PathSegment::Key(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found: value_type_name(other),
        }),
        (PathSegment::Index(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found: value_type_name(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn path(s: &str) -> JsonPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_simple_and_nested() {
        assert_eq!(path("category"), JsonPath::root().key("category"));
        assert_eq!(path(".seo.keywords"), JsonPath::root().key("seo").key("keywords"));
        assert_eq!(
            path("items[2].name"),
            JsonPath::root().key("items").index(2).key("name")
        );
        assert_eq!(path("[0][1]"), JsonPath::root().index(0).index(1));
        assert!(path("").is_root());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "a..b".parse::<JsonPath>(),
            Err(PathParseError::EmptyKey(_))
        ));
        assert!(matches!(
            "a.".parse::<JsonPath>(),
            Err(PathParseError::EmptyKey(_))
        ));
        assert!(matches!(
            ".".parse::<JsonPath>(),
            Err(PathParseError::EmptyKey(_))
        ));
        assert!(matches!(
            "a[1".parse::<JsonPath>(),
            Err(PathParseError::UnclosedBracket(1))
        ));
        assert!(matches!(
            "a[x]".parse::<JsonPath>(),
            Err(PathParseError::InvalidIndex(..))
        ));
        assert!(matches!(
            "a[-1]".parse::<JsonPath>(),
            Err(PathParseError::InvalidIndex(..))
        ));
        assert!(matches!(
            "a b".parse::<JsonPath>(),
            Err(PathParseError::UnexpectedChar(' ', 1))
        ));
    }

    #[test]
    fn test_parse_rejects_overlong_path() {
        let long = vec!["k"; MAX_PATH_LENGTH + 1].join(".");
        assert!(matches!(
            long.parse::<JsonPath>(),
            Err(PathParseError::TooLong(_))
        ));
    }

    #[test]
    fn test_mariadb_path_rendering() {
        assert_eq!(JsonPath::root().to_mariadb_path(), "$");
        assert_eq!(path("tags[0]").to_mariadb_path(), "$.tags[0]");
        assert_eq!(path("flag-reason").to_mariadb_path(), "$.\"flag-reason\"");
    }

    #[test]
    fn test_display_round_trip() {
        let p = path("seo.keywords[1]");
        assert_eq!(p.to_string(), "seo.keywords[1]");
        assert_eq!(p.to_string().parse::<JsonPath>().unwrap(), p);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let p = path("seo.keywords[1]");
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(text, "\"seo.keywords[1]\"");
        assert_eq!(serde_json::from_str::<JsonPath>(&text).unwrap(), p);
        assert!(serde_json::from_str::<JsonPath>("\"a[\"").is_err());
    }

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-zA-Z0-9_-]{1,12}".prop_map(PathSegment::Key),
            (0usize..10_000).prop_map(PathSegment::Index),
        ]
    }

    proptest! {
        #[test]
        fn test_text_form_round_trips(segments in prop::collection::vec(segment(), 0..12)) {
            let path = JsonPath(segments);
            let text = path.to_string();
            prop_assert_eq!(text.parse::<JsonPath>().unwrap(), path);
        }
    }

    #[test]
    fn test_get_at_path() {
        let doc = json!({"seo": {"keywords": ["database", "orm"]}, "category": "Tutorial"});
        assert_eq!(get_at_path(&doc, &path("category")), Some(&json!("Tutorial")));
        assert_eq!(get_at_path(&doc, &path("seo.keywords[1]")), Some(&json!("orm")));
        assert_eq!(get_at_path(&doc, &path("seo.missing")), None);
        assert_eq!(get_at_path(&doc, &path("category.inner")), None);
        assert_eq!(get_at_path(&doc, &JsonPath::root()), Some(&doc));
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut doc = json!({});
        set_at_path(&mut doc, &path("seo.description"), json!("A post")).unwrap();
        set_at_path(&mut doc, &path("tags[0]"), json!("rust")).unwrap();
        assert_eq!(doc, json!({"seo": {"description": "A post"}, "tags": ["rust"]}));
    }

    #[test]
    fn test_set_type_mismatch_leaves_document() {
        let mut doc = json!({"tags": "not-a-list"});
        let err = set_at_path(&mut doc, &path("tags[0]"), json!("x")).unwrap_err();
        assert_eq!(
            err,
            JsonPathError::TypeMismatch {
                expected: "array",
                found: "string"
            }
        );
        assert_eq!(doc, json!({"tags": "not-a-list"}));
    }

    #[test]
    fn test_set_index_out_of_bounds() {
        let mut doc = json!({"tags": []});
        let err = set_at_path(&mut doc, &path("tags[3]"), json!("x")).unwrap_err();
        assert_eq!(err, JsonPathError::IndexOutOfBounds { index: 3, len: 0 });
    }

    #[test]
    fn test_delete_at_path() {
        let mut doc = json!({"a": {"b": 1, "c": 2}, "list": [1, 2, 3]});
        assert_eq!(delete_at_path(&mut doc, &path("a.b")).unwrap(), Some(json!(1)));
        assert_eq!(delete_at_path(&mut doc, &path("list[0]")).unwrap(), Some(json!(1)));
        assert_eq!(delete_at_path(&mut doc, &path("list[9]")).unwrap(), None);
        assert_eq!(delete_at_path(&mut doc, &path("missing.x")).unwrap(), None);
        assert_eq!(doc, json!({"a": {"c": 2}, "list": [2, 3]}));
    }

    #[test]
    fn test_validate_document_bounds() {
        let mut deep = json!(1);
        for _ in 0..=MAX_NESTING_DEPTH {
            deep = json!([deep]);
        }
        assert!(matches!(
            validate_document(&deep),
            Err(LimitError::NestingTooDeep { .. })
        ));
        assert!(validate_document(&json!({"a": [1, 2, {"b": null}]})).is_ok());

        let wide = JsonValue::Array(vec![JsonValue::Null; MAX_ARRAY_SIZE + 1]);
        assert!(matches!(
            validate_document(&json!({"inner": wide})),
            Err(LimitError::ArrayTooLarge { .. })
        ));
    }
}
