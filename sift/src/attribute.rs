//! Attribute resolution: maps the logical name at the head of a filter path
//! to a storage field.
//!
//! ```toml
//! [name]
//! path = "people.full_name"
//! kind = "text"
//!
//! [age]
//! path = "age"
//! kind = "integer"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::query::FilterSegment;
use crate::{Error, Result};

/// Type tag of a storage field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Text,
    Integer,
    Float,
    Boolean,
}

/// A cleaned, typed filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AttributeKind {
    /// Convert raw text to a value of this kind. Invalid input yields `None`.
    pub fn clean(self, raw: &str) -> Option<TypedValue> {
        match self {
            AttributeKind::Text => Some(TypedValue::Text(raw.to_string())),
            AttributeKind::Integer => raw.trim().parse().ok().map(TypedValue::Integer),
            AttributeKind::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(TypedValue::Float),
            AttributeKind::Boolean => parse_bool(raw).map(TypedValue::Boolean),
        }
    }
}

/// Parse the usual spellings of a boolean, ignoring case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Descriptor for one filterable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Dotted storage path substituted for the logical name.
    path: String,
    kind: AttributeKind,
}

impl Attribute {
    pub fn new(path: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn text(path: impl Into<String>) -> Self {
        Self::new(path, AttributeKind::Text)
    }

    pub fn integer(path: impl Into<String>) -> Self {
        Self::new(path, AttributeKind::Integer)
    }

    pub fn float(path: impl Into<String>) -> Self {
        Self::new(path, AttributeKind::Float)
    }

    pub fn boolean(path: impl Into<String>) -> Self {
        Self::new(path, AttributeKind::Boolean)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Clean a raw value for this field. Invalid input yields `None`.
    pub fn try_clean(&self, raw: &str) -> Option<TypedValue> {
        self.kind.clean(raw)
    }

    /// Full storage path for a segment: this attribute's path followed by
    /// the segment's remaining components.
    pub fn storage_path<'a>(&'a self, segment: &'a FilterSegment) -> Vec<&'a str> {
        self.path
            .split('.')
            .chain(segment.subpath().iter().map(String::as_str))
            .collect()
    }
}

/// Looks up attributes by logical name.
pub trait AttributeResolver {
    fn resolve(&self, name: &str) -> Option<&Attribute>;
}

/// A resolver backed by a name → attribute table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: HashMap<String, Attribute>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.fields.insert(name.into(), attribute);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a field table from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse field map: {}", e)))
    }

    /// Load a field table from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

impl AttributeResolver for FieldMap {
    fn resolve(&self, name: &str) -> Option<&Attribute> {
        self.fields.get(name)
    }
}
