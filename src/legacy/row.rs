//! Schema-less rows read from a legacy database

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// A single SQLite value, typed by its storage class
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl LegacyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LegacyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value; numeric text is accepted
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LegacyValue::Integer(i) => Some(*i),
            LegacyValue::Text(s) => s.trim().parse().ok(),
            LegacyValue::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            _ => None,
        }
    }
}

impl Serialize for LegacyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LegacyValue::Null => serializer.serialize_unit(),
            LegacyValue::Integer(i) => serializer.serialize_i64(*i),
            LegacyValue::Real(r) => serializer.serialize_f64(*r),
            LegacyValue::Text(s) => serializer.serialize_str(s),
            // Blobs have no JSON form; emit them as lossy UTF-8 text
            LegacyValue::Blob(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl fmt::Display for LegacyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyValue::Null => write!(f, "NULL"),
            LegacyValue::Integer(i) => write!(f, "{}", i),
            LegacyValue::Real(r) => write!(f, "{}", r),
            LegacyValue::Text(s) => write!(f, "{}", s),
            LegacyValue::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

/// An ordered column-name to value mapping
///
/// Field order follows the column order reported for the table, and the row
/// serializes as a JSON object in that same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyRow {
    fields: Vec<(String, LegacyValue)>,
}

impl LegacyRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the value if the name is already present
    pub fn push(&mut self, name: impl Into<String>, value: LegacyValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LegacyValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LegacyValue> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LegacyValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, LegacyValue)> for LegacyRow {
    fn from_iter<I: IntoIterator<Item = (K, LegacyValue)>>(iter: I) -> Self {
        let mut row = LegacyRow::new();
        for (name, value) in iter {
            row.push(name, value);
        }
        row
    }
}

impl Serialize for LegacyRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
