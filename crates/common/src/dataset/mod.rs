//! Dataset documents and the packages they travel in.
//!
//! A dataset version is a DAG-CBOR manifest blob. Its `body_path` points at a
//!  JSON body blob (an array of rows) and its `previous` link points at the
//!  manifest of the version before it, so the manifest address doubles as
//!  the version's identity.

mod package;
mod validate;

pub use package::{Block, Package, PackageError};
pub use validate::{validate_body, ValidationError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::linked_data::ContentAddress;

/// Type a schema field is checked against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    #[default]
    Any,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Any => "any",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub format: String,
    pub schema: Vec<Field>,
}

impl Default for Structure {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            schema: Vec::new(),
        }
    }
}

/// One version of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub title: String,
    pub description: String,
    pub structure: Structure,
    pub body_path: Option<ContentAddress>,
    pub previous: Option<ContentAddress>,
    pub timestamp: DateTime<Utc>,
    /// Query text that produced this dataset, if it is the output of one
    pub query: Option<String>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            structure: Structure::default(),
            body_path: None,
            previous: None,
            timestamp: Utc::now(),
            query: None,
        }
    }
}

impl Dataset {
    /// Case-insensitive match of a search term against the title and
    ///  description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}
