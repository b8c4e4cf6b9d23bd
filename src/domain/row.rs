//! Result row model.
//!
//! A [`Row`] is one aircraft state vector as returned by the service: a flat
//! mapping of field name to scalar value. Rows are identified by their `id`
//! field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the field carrying a row's stable identity.
pub const ROW_ID_FIELD: &str = "id";

/// A scalar cell value. `Null` means "unknown" (e.g. no altitude report).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, FieldValue>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion, mostly for tests and fixtures.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Returns the row's identity, rendered as text.
    ///
    /// `None` when the service omitted the id column, which the session treats
    /// as a row without identity rather than an error.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.fields.get(ROW_ID_FIELD)? {
            FieldValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}
