//! In-memory preferences, for tests and for running without a writable
//! data directory.

use crate::domain::Result;
use crate::storage::backend::Preferences;
use crate::storage::models::PreferenceKey;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<PreferenceKey, Value>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preferences for MemoryPreferences {
    fn get_raw(&self, key: PreferenceKey) -> Result<Option<Value>> {
        Ok(self.values.get(&key).cloned())
    }

    fn set_raw(&mut self, key: PreferenceKey, value: Value) -> Result<()> {
        tracing::trace!(key = %key, "preference set in memory");
        self.values.insert(key, value);
        Ok(())
    }
}
