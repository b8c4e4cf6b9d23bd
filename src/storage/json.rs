//! JSON file preferences backend.
//!
//! The whole document is held in memory and written back after every change,
//! using atomic file writes (write-to-temp + rename) so a crash never leaves a
//! half-written file behind.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "values": {
//!     "filters": {"origin_country": "Germany"},
//!     "pageSize": 100,
//!     "unitSystem": "imperial"
//!   },
//!   "updated_at": 1718000000
//! }
//! ```

use crate::domain::{FlightdeckError, Result};
use crate::storage::backend::Preferences;
use crate::storage::models::{PreferenceKey, PreferencesDocument, PREFERENCES_VERSION};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Preferences persisted to a JSON file.
pub struct JsonPreferences {
    file_path: PathBuf,
    data: PreferencesDocument,
    dirty: bool,
}

impl JsonPreferences {
    /// Opens the preferences file at `file_path`, creating parent directories.
    ///
    /// A missing file starts empty. A file that cannot be parsed is an error
    /// rather than silently overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// existing file cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use flightdeck::storage::JsonPreferences;
    /// use std::path::PathBuf;
    ///
    /// let prefs = JsonPreferences::open(PathBuf::from("/tmp/flightdeck/preferences.json"))?;
    /// # Ok::<(), flightdeck::domain::FlightdeckError>(())
    /// ```
    pub fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening preferences");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("no preferences file yet");
            PreferencesDocument::default()
        };

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<PreferencesDocument> {
        let contents = std::fs::read_to_string(path)?;
        let data: PreferencesDocument = serde_json::from_str(&contents)
            .map_err(|e| FlightdeckError::Storage(format!("failed to parse preferences: {e}")))?;

        if data.version > PREFERENCES_VERSION {
            tracing::warn!(
                version = data.version,
                supported = PREFERENCES_VERSION,
                "preferences written by a newer version"
            );
        }
        tracing::debug!(keys = data.values.len(), "loaded preferences");
        Ok(data)
    }

    /// Writes the document if it changed since the last save.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        self.data.updated_at = Some(chrono::Utc::now().timestamp());
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| FlightdeckError::Storage(format!("failed to serialize preferences: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!(path = ?self.file_path, "preferences saved");
        Ok(())
    }
}

impl Preferences for JsonPreferences {
    fn get_raw(&self, key: PreferenceKey) -> Result<Option<Value>> {
        Ok(self.data.values.get(key.as_str()).cloned())
    }

    fn set_raw(&mut self, key: PreferenceKey, value: Value) -> Result<()> {
        let _span = tracing::debug_span!("json_set_preference", key = %key).entered();

        if self.data.values.get(key.as_str()) == Some(&value) {
            return Ok(());
        }
        self.data.values.insert(key.as_str().to_string(), value);
        self.dirty = true;
        self.flush()
    }
}

impl Drop for JsonPreferences {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("saving dirty preferences on drop");
            if let Err(e) = self.flush() {
                tracing::error!(error = %e, "failed to save preferences on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SortModel, SortOrder};
    use crate::storage::PreferencesExt;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        {
            let mut prefs = JsonPreferences::open(path.clone()).unwrap();
            prefs.set(PreferenceKey::PageSize, &100_usize).unwrap();
            prefs
                .set(
                    PreferenceKey::SortModel,
                    &Some(SortModel { field: "velocity".into(), order: SortOrder::Descending }),
                )
                .unwrap();
        }

        let prefs = JsonPreferences::open(path).unwrap();
        assert_eq!(prefs.get(PreferenceKey::PageSize, 50_usize).unwrap(), 100);
        let sort: Option<SortModel> = prefs.get(PreferenceKey::SortModel, None).unwrap();
        assert_eq!(sort.map(|s| s.field), Some("velocity".to_string()));
    }

    #[test]
    fn writes_versioned_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let mut prefs = JsonPreferences::open(path.clone()).unwrap();
        prefs.set(PreferenceKey::Page, &3_usize).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["values"]["page"], 3);
        assert!(raw["updated_at"].is_i64());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(JsonPreferences::open(path), Err(FlightdeckError::Storage(_))));
    }

    #[test]
    fn wrong_shaped_value_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"version": 1, "values": {"pageSize": "lots"}}"#).unwrap();

        let prefs = JsonPreferences::open(path).unwrap();
        assert_eq!(prefs.get(PreferenceKey::PageSize, 50_usize).unwrap(), 50);
    }
}
