//! Query request and response model.
//!
//! These are the values the session exchanges with the data service: a
//! [`QueryRequest`] describing one page of a filtered, sorted view and the
//! [`QueryResponse`] the service answers with. Both are plain data; the request
//! token that correlates them lives on the wire envelope in
//! [`crate::channel::messages`].

use crate::domain::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opaque pagination token returned by the service.
///
/// The client never interprets a cursor; it only stores it in the ledger and
/// sends it back. The reference service uses the id of the last row on a page,
/// other services hand out strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cursor {
    Number(i64),
    Text(String),
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Cursor {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// A single filter predicate value.
///
/// Sets are sent as JSON arrays and mean "field is one of"; a lone string means
/// substring match on the service side; numbers pair with the `_gt` / `_lt` key
/// suffixes for range predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Set(BTreeSet<String>),
}

impl FilterValue {
    /// Parses a user-typed value: `true`/`false`, a number, a comma-separated
    /// set, or plain text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Number(n.into());
        }
        if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Self::Number(n);
        }
        if raw.contains(',') {
            return Self::Set(
                raw.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        Self::Text(raw.to_string())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Set(values) => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(","))
            }
        }
    }
}

/// Active filter predicates keyed by filter key (field name, optionally with a
/// range suffix).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, FilterValue>);

/// A partial filter edit: `Some` sets a key, `None` removes it.
pub type FilterPatch = BTreeMap<String, Option<FilterValue>>;

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a partial edit in place.
    pub fn apply(&mut self, patch: &FilterPatch) {
        for (key, value) in patch {
            match value {
                Some(v) => {
                    self.0.insert(key.clone(), v.clone());
                }
                None => {
                    self.0.remove(key);
                }
            }
        }
    }

    /// Returns a copy with `patch` applied.
    #[must_use]
    pub fn patched(&self, patch: &FilterPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, FilterValue)> for Filters {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    /// Parses `asc`/`desc` (and their long forms), case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// The active sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortModel {
    pub field: String,
    pub order: SortOrder,
}

/// One page query, immutable once sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub filters: Filters,
    pub page_size: usize,
    pub cursor: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort_order: Option<SortOrder>,
}

impl QueryRequest {
    #[must_use]
    pub fn new(
        filters: Filters,
        sort: Option<&SortModel>,
        page_size: usize,
        cursor: Option<Cursor>,
    ) -> Self {
        Self {
            filters,
            page_size,
            cursor,
            sort_field: sort.map(|s| s.field.clone()),
            sort_order: sort.map(|s| s.order),
        }
    }
}

/// The service's answer to one [`QueryRequest`].
///
/// A response with `error` set carries no usable rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Row>,

    /// Total rows matching the filters, independent of paging. `None` only on
    /// error responses.
    #[serde(default)]
    pub results_count: Option<u64>,

    /// Echo of the requested page size (sent by the reference service).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    #[serde(default)]
    pub next_cursor: Option<Cursor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Builds a successful page.
    #[must_use]
    pub fn page(results: Vec<Row>, results_count: u64, next_cursor: Option<Cursor>) -> Self {
        Self {
            results,
            results_count: Some(results_count),
            page_size: None,
            next_cursor,
            error: None,
        }
    }

    /// Builds a server-reported failure.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// A response is usable if it reports an error or carries a result count.
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        self.error.is_some() || self.results_count.is_some()
    }
}
