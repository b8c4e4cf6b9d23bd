//! Preferences backend abstraction.
//!
//! [`Preferences`] is the synchronous get/set boundary the session persists
//! user choices through. It is deliberately untyped (JSON values) so it stays
//! object-safe; [`PreferencesExt`] layers typed access with defaults on top.
//!
//! # Implementations
//!
//! - [`crate::storage::JsonPreferences`]: JSON file with atomic writes
//! - [`crate::storage::MemoryPreferences`]: in-process map, nothing persisted
//!
//! # Examples
//!
//! ```
//! use flightdeck::storage::{MemoryPreferences, PreferenceKey, PreferencesExt};
//!
//! let mut prefs = MemoryPreferences::new();
//! assert_eq!(prefs.get(PreferenceKey::PageSize, 50_usize)?, 50);
//! prefs.set(PreferenceKey::PageSize, &100_usize)?;
//! assert_eq!(prefs.get(PreferenceKey::PageSize, 50_usize)?, 100);
//! # Ok::<(), flightdeck::domain::FlightdeckError>(())
//! ```

use crate::domain::Result;
use crate::storage::models::{PreferenceKey, SavedView};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Key/value persistence for user preferences.
pub trait Preferences {
    /// Raw stored value for `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_raw(&self, key: PreferenceKey) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set_raw(&mut self, key: PreferenceKey, value: Value) -> Result<()>;
}

impl<P: Preferences + ?Sized> Preferences for Box<P> {
    fn get_raw(&self, key: PreferenceKey) -> Result<Option<Value>> {
        (**self).get_raw(key)
    }

    fn set_raw(&mut self, key: PreferenceKey, value: Value) -> Result<()> {
        (**self).set_raw(key, value)
    }
}

/// Typed access on top of [`Preferences`].
pub trait PreferencesExt: Preferences {
    /// Stored value for `key`, or `default` when absent or unreadable.
    ///
    /// A stored value of the wrong shape is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself fails.
    fn get<T: DeserializeOwned>(&self, key: PreferenceKey, default: T) -> Result<T> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(default);
        };
        match serde_json::from_value(raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "ignoring unreadable preference");
                Ok(default)
            }
        }
    }

    /// Serializes and stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error or the backend's write error.
    fn set<T: Serialize + ?Sized>(&mut self, key: PreferenceKey, value: &T) -> Result<()> {
        let raw = serde_json::to_value(value)?;
        self.set_raw(key, raw)
    }

    /// Reads every session preference, falling back to `page_size` and
    /// otherwise-empty defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_view(&self, page_size: usize) -> Result<SavedView> {
        let stored_size = self.get(PreferenceKey::PageSize, page_size)?;
        Ok(SavedView {
            page: self.get(PreferenceKey::Page, 0)?,
            page_size: if stored_size == 0 { page_size } else { stored_size },
            sort: self.get(PreferenceKey::SortModel, None)?,
            filters: self.get(PreferenceKey::Filters, Default::default())?,
            unit_system: self.get(PreferenceKey::UnitSystem, Default::default())?,
        })
    }
}

impl<P: Preferences + ?Sized> PreferencesExt for P {}
