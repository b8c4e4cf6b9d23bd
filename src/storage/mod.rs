//! Storage layer for user preferences.
//!
//! The session persists the user's view (filters, sort, page, page size, unit
//! system) through the [`Preferences`] trait so that it survives restarts.
//!
//! # Modules
//!
//! - `backend`: the [`Preferences`] trait and its typed extension
//! - `json`: JSON file implementation with atomic writes
//! - `memory`: in-process implementation
//! - `models`: preference keys and the file document

pub mod backend;
pub mod json;
pub mod memory;
pub mod models;

pub use backend::{Preferences, PreferencesExt};
pub use json::JsonPreferences;
pub use memory::MemoryPreferences;
pub use models::{PreferenceKey, PreferencesDocument, SavedView, PREFERENCES_VERSION};
