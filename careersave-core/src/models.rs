//! Data model for decoded save tables.
//!
//! Decoded saves have no fixed schema: every table carries its own set of
//! fields and the decoder may split one save into several sub-databases.
//! Records are therefore maps from field name to a closed [`Scalar`] union,
//! and table sets keep insertion order so rankings and snapshots are stable.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CareerSaveError, Result};

/// A single field value inside a record.
///
/// Decoded saves hold flat values almost everywhere; the occasional array or
/// object field is kept verbatim as [`Scalar::Nested`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON `null`
    Null,
    /// JSON boolean
    Bool(bool),
    /// JSON number, integer or float as decoded
    Number(serde_json::Number),
    /// JSON string
    String(String),
    /// Array or object field, never treated as an identifier
    Nested(Value),
}

impl Scalar {
    /// Converts a JSON value; arrays and objects become [`Scalar::Nested`].
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Nested(nested),
        }
    }

    /// Returns true for the JSON `null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for a numeric zero (`0`, `-0`, `0.0`).
    ///
    /// The string `"0"` is not zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Number(n) => n.as_f64() == Some(0.0),
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::Nested(value) => write!(f, "{}", value),
        }
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Result of looking a field up by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// The record has no field with that name
    Missing,
    /// The field exists (its value may still be `null`)
    Present(&'a Scalar),
}

impl<'a> FieldValue<'a> {
    /// Returns the scalar when present.
    pub fn scalar(self) -> Option<&'a Scalar> {
        match self {
            Self::Missing => None,
            Self::Present(value) => Some(value),
        }
    }
}

/// One row of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Scalar>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Looks up a field; absent fields yield [`FieldValue::Missing`].
    pub fn get(&self, field: &str) -> FieldValue<'_> {
        self.fields
            .get(field)
            .map_or(FieldValue::Missing, FieldValue::Present)
    }

    /// Field names in decoder order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn from_json(value: Value) -> Option<Self> {
        let Value::Object(object) = value else {
            return None;
        };

        Some(Self {
            fields: object
                .into_iter()
                .map(|(name, value)| (name, Scalar::from_json(value)))
                .collect(),
        })
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The value stored under one table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableValue {
    /// An ordered sequence of records
    Rows(Vec<Record>),
    /// Anything else, kept verbatim: metadata blobs, or sequences whose
    /// elements are not all records
    Opaque(Value),
}

impl TableValue {
    /// Classifies a decoded table.
    ///
    /// A sequence becomes `Rows` only when every element is an object; other
    /// sequences stay opaque but still count their elements.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => {
                Self::Rows(items.into_iter().filter_map(Record::from_json).collect())
            }
            other => Self::Opaque(other),
        }
    }

    /// Returns the rows if this table is a sequence.
    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Opaque(_) => None,
        }
    }

    /// Element count for sequences, `None` for non-sequence values.
    pub fn record_count(&self) -> Option<usize> {
        match self {
            Self::Rows(rows) => Some(rows.len()),
            Self::Opaque(Value::Array(items)) => Some(items.len()),
            Self::Opaque(_) => None,
        }
    }

    /// Returns true for any sequence, records or not.
    pub fn is_sequence(&self) -> bool {
        self.record_count().is_some()
    }
}

impl From<Vec<Record>> for TableValue {
    fn from(rows: Vec<Record>) -> Self {
        Self::Rows(rows)
    }
}

/// Mapping from table name to table contents, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSet {
    tables: IndexMap<String, TableValue>,
}

/// A table set produced by a single decoding pass.
pub type Fragment = TableSet;

impl TableSet {
    /// Creates an empty table set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a table.
    pub fn with_table(mut self, name: impl Into<String>, value: impl Into<TableValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a table, replacing any table of the same name in place.
    ///
    /// Returns the replaced value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<TableValue>,
    ) -> Option<TableValue> {
        self.tables.insert(name.into(), value.into())
    }

    /// Looks up a table by name.
    pub fn get(&self, name: &str) -> Option<&TableValue> {
        self.tables.get(name)
    }

    /// Returns the rows of a table, if it exists and is a sequence.
    pub fn rows(&self, name: &str) -> Option<&[Record]> {
        self.get(name).and_then(TableValue::rows)
    }

    /// Returns true if a table with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if there are no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterates tables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableValue)> {
        self.tables.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Table names in insertion order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Converts a JSON object into a table set.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => {
                let mut tables = IndexMap::with_capacity(object.len());
                for (name, value) in object {
                    let table = TableValue::from_json(value);
                    if matches!(table, TableValue::Opaque(Value::Array(_))) {
                        tracing::debug!("Table {} holds non-record elements; rows not inspected", name);
                    }
                    tables.insert(name, table);
                }
                Ok(Self { tables })
            }
            other => Err(CareerSaveError::malformed(format!(
                "expected a table set object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

impl IntoIterator for TableSet {
    type Item = (String, TableValue);
    type IntoIter = indexmap::map::IntoIter<String, TableValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

/// What the decoder returned for one save file.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedOutput {
    /// The save held a single database
    Single(Fragment),
    /// The save split into several sub-databases, in decoder order
    Many(Vec<Fragment>),
}

impl DecodedOutput {
    /// Classifies raw decoder JSON.
    ///
    /// # Errors
    /// Returns `MalformedFragment` when the value is neither a table set nor an
    /// array of table sets. Table contents are never rejected.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) => TableSet::from_json(value).map(Self::Single),
            Value::Array(elements) => elements
                .into_iter()
                .enumerate()
                .map(|(index, element)| match element {
                    Value::Object(_) => TableSet::from_json(element),
                    other => Err(CareerSaveError::malformed(format!(
                        "element {} of decoder output is {}, expected a table set",
                        index,
                        json_kind(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Many),
            other => Err(CareerSaveError::malformed(format!(
                "decoder output is {}, expected a table set or an array of table sets",
                json_kind(&other)
            ))),
        }
    }

    /// Number of databases the decoder produced.
    pub fn fragment_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(fragments) => fragments.len(),
        }
    }

    /// The first fragment that contains `table`, without merging.
    pub fn first_with_table(&self, table: &str) -> Option<&Fragment> {
        match self {
            Self::Single(fragment) => Some(fragment).filter(|f| f.contains(table)),
            Self::Many(fragments) => fragments.iter().find(|f| f.contains(table)),
        }
    }
}

/// Short description of a JSON value's shape for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
