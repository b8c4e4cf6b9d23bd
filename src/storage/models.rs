//! Preference keys and the on-disk preferences document.
//!
//! Values are stored as loose JSON so that an older or newer build reading
//! the same file only loses the keys it cannot understand.

use crate::domain::{Filters, SortModel, UnitSystem};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Current version of the preferences file format.
pub const PREFERENCES_VERSION: u32 = 1;

/// The preference slots a query session reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Page,
    PageSize,
    SortModel,
    Filters,
    UnitSystem,
}

impl PreferenceKey {
    pub const ALL: [Self; 5] = [
        Self::Page,
        Self::PageSize,
        Self::SortModel,
        Self::Filters,
        Self::UnitSystem,
    ];

    /// Key as stored on disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::PageSize => "pageSize",
            Self::SortModel => "sortModel",
            Self::Filters => "filters",
            Self::UnitSystem => "unitSystem",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level structure of the preferences file.
///
/// ```json
/// {
///   "version": 1,
///   "values": { "pageSize": 100, "sortModel": {"field": "velocity", "order": "desc"} },
///   "updated_at": 1718000000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesDocument {
    pub version: u32,

    #[serde(default)]
    pub values: BTreeMap<String, Value>,

    /// Unix timestamp of the last write.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Default for PreferencesDocument {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            values: BTreeMap::new(),
            updated_at: None,
        }
    }
}

/// Everything a session restores from preferences at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedView {
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortModel>,
    pub filters: Filters,
    pub unit_system: UnitSystem,
}
