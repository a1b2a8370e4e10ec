//! Wire schemas for the `add` and `search` documents.
//!
//! Validation happens in two steps: the raw bytes must parse as JSON, then
//! the JSON must fit the declared [`Shape`]. Shapes are static tables so the
//! wire contract can be read in one place. A conforming document is then
//! converted into typed form without coercion: numbers stay numbers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// Result type for schema validation.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Which of the two wire schemas a payload must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Add,
    Search,
}

impl SchemaKind {
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::Add => "add",
            SchemaKind::Search => "search",
        }
    }

    fn shape(self) -> &'static Shape {
        match self {
            SchemaKind::Add => &ADD_SCHEMA,
            SchemaKind::Search => &SEARCH_SCHEMA,
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemaKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(SchemaKind::Add),
            "search" => Ok(SchemaKind::Search),
            other => Err(SchemaError::UnknownSchema { kind: other.into() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Structural constraint on a JSON value.
#[derive(Debug)]
pub enum Shape {
    /// A string with at least `min_len` characters.
    String { min_len: usize },
    /// A string (with at least `min_len` characters) or any number.
    StringOrNumber { min_len: usize },
    /// An array of `items`.
    Array {
        items: &'static Shape,
        min_items: usize,
        unique: bool,
    },
    /// An object with exactly these keys available; extra keys are rejected.
    Object { fields: &'static [Field] },
}

/// One key of an object shape.
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    pub shape: &'static Shape,
}

static ADD_PROPERTY: Shape = Shape::Object {
    fields: &[
        Field {
            name: "propertyName",
            required: true,
            shape: &Shape::String { min_len: 0 },
        },
        Field {
            name: "propertyValue",
            required: true,
            shape: &Shape::StringOrNumber { min_len: 0 },
        },
    ],
};

static ADD_ENTRY: Shape = Shape::Object {
    fields: &[
        Field {
            name: "compound",
            required: true,
            shape: &Shape::String { min_len: 0 },
        },
        Field {
            name: "properties",
            required: true,
            shape: &Shape::Array {
                items: &ADD_PROPERTY,
                min_items: 1,
                unique: true,
            },
        },
    ],
};

static ADD_SCHEMA: Shape = Shape::Array {
    items: &ADD_ENTRY,
    min_items: 1,
    unique: true,
};

static SEARCH_COMPOUND: Shape = Shape::Object {
    fields: &[
        Field {
            name: "logic",
            required: true,
            shape: &Shape::String { min_len: 0 },
        },
        Field {
            name: "value",
            required: true,
            shape: &Shape::String { min_len: 1 },
        },
    ],
};

static SEARCH_PROPERTY: Shape = Shape::Object {
    fields: &[
        Field {
            name: "name",
            required: true,
            shape: &Shape::String { min_len: 1 },
        },
        Field {
            name: "value",
            required: true,
            shape: &Shape::StringOrNumber { min_len: 1 },
        },
        Field {
            name: "logic",
            required: true,
            shape: &Shape::String { min_len: 0 },
        },
    ],
};

static SEARCH_SCHEMA: Shape = Shape::Object {
    fields: &[
        Field {
            name: "compound",
            required: false,
            shape: &SEARCH_COMPOUND,
        },
        Field {
            name: "properties",
            required: false,
            shape: &Shape::Array {
                items: &SEARCH_PROPERTY,
                min_items: 1,
                unique: true,
            },
        },
    ],
};

/// Check `value` against `shape`, reporting the first violation with its
/// JSON-pointer path.
pub fn check(value: &Value, shape: &Shape, path: &str) -> Result<(), String> {
    let at = |path: &str| if path.is_empty() { "/".to_string() } else { path.to_string() };
    match shape {
        Shape::String { min_len } => match value {
            Value::String(s) => check_len(s, *min_len, &at(path)),
            other => Err(format!("{}: expected a string, got {}", at(path), type_name(other))),
        },
        Shape::StringOrNumber { min_len } => match value {
            Value::String(s) => check_len(s, *min_len, &at(path)),
            Value::Number(_) => Ok(()),
            other => Err(format!(
                "{}: expected a string or a number, got {}",
                at(path),
                type_name(other)
            )),
        },
        Shape::Array {
            items,
            min_items,
            unique,
        } => {
            let Value::Array(elements) = value else {
                return Err(format!("{}: expected an array, got {}", at(path), type_name(value)));
            };
            if elements.len() < *min_items {
                return Err(format!(
                    "{}: expected at least {min_items} item(s), got {}",
                    at(path),
                    elements.len()
                ));
            }
            if *unique {
                for (i, a) in elements.iter().enumerate() {
                    if let Some(j) = elements[..i].iter().position(|b| same_json(a, b)) {
                        return Err(format!("{}: items {j} and {i} are identical", at(path)));
                    }
                }
            }
            for (i, element) in elements.iter().enumerate() {
                check(element, items, &format!("{path}/{i}"))?;
            }
            Ok(())
        }
        Shape::Object { fields } => {
            let Value::Object(map) = value else {
                return Err(format!("{}: expected an object, got {}", at(path), type_name(value)));
            };
            if let Some(extra) = map.keys().find(|k| !fields.iter().any(|f| f.name == k.as_str())) {
                return Err(format!("{}: unexpected key \"{extra}\"", at(path)));
            }
            for field in fields.iter() {
                match map.get(field.name) {
                    Some(v) => check(v, field.shape, &format!("{path}/{}", field.name))?,
                    None if field.required => {
                        return Err(format!(
                            "{}: missing required key \"{}\"",
                            at(path),
                            field.name
                        ));
                    }
                    None => {}
                }
            }
            Ok(())
        }
    }
}

fn check_len(s: &str, min_len: usize, path: &str) -> Result<(), String> {
    if s.chars().count() < min_len {
        Err(format!("{path}: string shorter than {min_len} character(s)"))
    } else {
        Ok(())
    }
}

/// JSON equality where numbers compare by value, so `1` equals `1.0`.
fn same_json(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_json(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| same_json(x, y)))
        }
        _ => a == b,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Typed documents
// ---------------------------------------------------------------------------

/// A property value as sent on the wire: a string or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Number(serde_json::Number),
}

impl ScalarValue {
    /// Canonical text form: strings as-is, numbers in their JSON spelling.
    ///
    /// Numbers are always rendered to text before classification, so `18`
    /// and `"18"` behave identically everywhere.
    pub fn canonical(&self) -> String {
        match self {
            ScalarValue::Text(s) => s.clone(),
            ScalarValue::Number(n) => n.to_string(),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// One property of an `add` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddProperty {
    #[serde(rename = "propertyName")]
    pub name: String,
    #[serde(rename = "propertyValue")]
    pub value: ScalarValue,
}

/// One material of an `add` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEntry {
    pub compound: String,
    pub properties: Vec<AddProperty>,
}

/// A validated `add` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddDocument {
    pub entries: Vec<AddEntry>,
}

/// Compound filter of a `search` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundFilter {
    pub logic: String,
    pub value: String,
}

/// Property filter of a `search` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyFilter {
    pub name: String,
    pub value: ScalarValue,
    pub logic: String,
}

/// A validated `search` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound: Option<CompoundFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyFilter>,
}

/// A payload that passed validation for its schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedDocument {
    Add(AddDocument),
    Search(SearchDocument),
}

/// Parse `payload` and check it against the `kind` schema.
pub fn validate(payload: &[u8], kind: SchemaKind) -> SchemaResult<ValidatedDocument> {
    let value: Value = serde_json::from_slice(payload).map_err(|_| SchemaError::NotADocument)?;
    check(&value, kind.shape(), "").map_err(|reason| nonconforming(kind, reason))?;
    let document = match kind {
        SchemaKind::Add => ValidatedDocument::Add(
            serde_json::from_value(value).map_err(|e| nonconforming(kind, e.to_string()))?,
        ),
        SchemaKind::Search => ValidatedDocument::Search(
            serde_json::from_value(value).map_err(|e| nonconforming(kind, e.to_string()))?,
        ),
    };
    tracing::debug!(schema = %kind, "document validated");
    Ok(document)
}

/// Validate an `add` payload.
pub fn validate_add(payload: &[u8]) -> SchemaResult<AddDocument> {
    match validate(payload, SchemaKind::Add)? {
        ValidatedDocument::Add(doc) => Ok(doc),
        ValidatedDocument::Search(_) => Err(nonconforming(SchemaKind::Add, "wrong kind".into())),
    }
}

/// Validate a `search` payload.
pub fn validate_search(payload: &[u8]) -> SchemaResult<SearchDocument> {
    match validate(payload, SchemaKind::Search)? {
        ValidatedDocument::Search(doc) => Ok(doc),
        ValidatedDocument::Add(_) => Err(nonconforming(SchemaKind::Search, "wrong kind".into())),
    }
}

fn nonconforming(kind: SchemaKind, reason: String) -> SchemaError {
    SchemaError::Nonconforming {
        schema: kind.name().into(),
        reason,
    }
}
