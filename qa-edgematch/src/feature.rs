//! Features, attribute values and feature identity.

use crate::geometry::{Envelope, GeometryKind};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a feature: class index plus row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub class_index: usize,
    pub row_id: u64,
}

impl FeatureKey {
    pub fn new(class_index: usize, row_id: u64) -> Self {
        Self {
            class_index,
            row_id,
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_index, self.row_id)
    }
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Value formatted for issue messages: text quoted, null as `<null>`.
    pub fn display(&self) -> String {
        match self {
            Value::Null => "<null>".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("'{s}'"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// A row of a feature class.
///
/// Field names are case-insensitive; they are stored uppercased.
#[derive(Debug, Clone)]
pub struct Feature {
    pub key: FeatureKey,
    pub shape: Geometry<f64>,
    attributes: BTreeMap<String, Value>,
    envelope: Option<Envelope>,
}

impl Feature {
    pub fn new(key: FeatureKey, shape: Geometry<f64>) -> Self {
        let envelope = Envelope::of(&shape);
        Self {
            key,
            shape,
            attributes: BTreeMap::new(),
            envelope,
        }
    }

    /// Add an attribute value.
    pub fn with_attribute(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set_attribute(field, value);
        self
    }

    pub fn set_attribute(&mut self, field: &str, value: impl Into<Value>) {
        self.attributes
            .insert(field.trim().to_uppercase(), value.into());
    }

    /// Value of a field; missing fields read as null.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.attributes
            .get(&field.to_uppercase())
            .unwrap_or(&NULL)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Envelope of the shape, `None` for empty shapes.
    pub fn envelope(&self) -> Option<Envelope> {
        self.envelope
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        GeometryKind::from_geometry(&self.shape)
    }
}
