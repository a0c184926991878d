//! Data models shared by the attribute and template services.
//!
//! Attribute documents are flat field maps stored one per check per index.
//! The group a check belongs to is encoded in its identifier, see [`CheckRef`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Field map of a stored document (`_source` in Elasticsearch terms).
pub type Fields = Map<String, Value>;

/// A document returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier within its index.
    pub id: String,
    /// Stored fields.
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// A check identifier split into its group and descriptor key.
///
/// Identifiers look like `<group><delimiter><check>`. Only the first
/// delimiter separates, so `team1-web-01` is group `team1`, key `web-01`.
/// An identifier without the delimiter is its own group and key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckRef {
    /// Full identifier, used as the document id and response key.
    pub id: String,
    /// Group (team) the check belongs to.
    pub group: String,
    /// Key of the check descriptor in the checks index.
    pub key: String,
}

impl CheckRef {
    pub fn parse(id: &str, delimiter: &str) -> Self {
        let (group, key) = match id.split_once(delimiter) {
            Some((group, key)) if !delimiter.is_empty() => (group, key),
            _ => (id, id),
        };

        Self {
            id: id.to_string(),
            group: group.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for CheckRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Display name and merged attributes of one check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAttributes {
    /// Human-readable check name from the check descriptor.
    pub name: String,
    /// Attribute name to current value.
    pub attributes: BTreeMap<String, String>,
}

impl CheckAttributes {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Merge a document's fields in, later values overwriting earlier ones.
    pub fn merge_fields(&mut self, fields: &Fields) {
        for (key, value) in fields {
            self.attributes.insert(key.clone(), attribute_value(value));
        }
    }
}

/// Response shape of `GET /attribute`: group -> check id -> attributes.
pub type GroupedAttributeView = BTreeMap<String, BTreeMap<String, CheckAttributes>>;

/// Render a stored field as an attribute value string.
///
/// Strings pass through untouched; anything else keeps its JSON text.
pub fn attribute_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
