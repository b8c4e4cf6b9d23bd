//! Flightdeck: a live-updating, cursor-paginated table client for aircraft
//! state vectors.
//!
//! Flightdeck keeps one filtered, sorted, paginated view of a large and
//! constantly changing data set coherent while talking to a remote query
//! service over a single WebSocket:
//! - Single-flight, latest-wins queries: only the most recent request may
//!   change what the view shows
//! - Cursor pagination backed by a ledger of page-start cursors
//! - Debounced filter edits, immediate sort and page changes
//! - Persistent view preferences (page, page size, sort, filters, units)
//! - Graceful handling of dropped connections and malformed frames

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Terminal shim (main.rs)                            │  ← tokio event loop
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Session (session.rs)                               │  ← owns everything
//! │  - Executes actions, publishes the view             │    below per view
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Coordinator   │   │ Channel       │   │ Storage       │
//! │ (app/)        │   │ (channel/)    │   │ (storage/)    │
//! │ - Event/action│   │ - Send queue  │   │ - Preferences │
//! │ - Ledger      │   │ - Wire codec  │   │ - JSON file   │
//! │ - Debouncer   │   │ - WebSocket   │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain & Infrastructure                            │
//! │  - Query model, rows, field catalogue (domain/)     │
//! │  - Data directory resolution (infrastructure/)      │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing subscriber + OTLP file export            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Coordinator state machine with the event/action model
//! - [`channel`]: Wire messages, the channel adapter and transports
//! - [`domain`]: Query model, rows, errors and the field catalogue
//! - [`infrastructure`]: Platform paths
//! - [`runtime`]: Tokio timer driver
//! - [`session`]: The per-view session object
//! - [`storage`]: Preferences persistence
//! - [`ui`]: Text table rendering and the line command parser
//! - `observability`: tracing and OpenTelemetry export
//!
//! # Configuration
//!
//! Settings come from defaults, then an optional TOML file, then command line
//! flags:
//!
//! ```toml
//! address = "ws://localhost:8000/ws"
//! page_size = 100
//! debounce_ms = 250
//! refresh_secs = 5
//! trace_level = "debug"
//! theme = "mono"
//! ```
//!
//! # Example
//!
//! ```rust
//! use flightdeck::channel::{MemoryTransport, TransportEvent};
//! use flightdeck::session::{ManualTimers, QuerySession};
//! use flightdeck::storage::MemoryPreferences;
//! use flightdeck::Config;
//!
//! let config = Config::default();
//! let mut session = QuerySession::new(
//!     config.session_options(),
//!     ManualTimers::new(),
//!     MemoryPreferences::new(),
//! )?;
//! session.connect(&config.address, MemoryTransport::new())?;
//! session.handle_transport_event(TransportEvent::Opened)?;
//! assert!(session.view().snapshot().is_loading);
//! # Ok::<(), flightdeck::FlightdeckError>(())
//! ```

pub mod app;
pub mod channel;
pub mod domain;
pub mod infrastructure;
pub mod runtime;
pub mod session;
pub mod storage;

pub mod ui;

pub mod observability;

pub use app::{handle_event, Action, Event, SessionState, ViewState, ViewStore};
pub use domain::{FlightdeckError, Result};
pub use session::{QuerySession, SessionOptions, TimerScheduler};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_ADDRESS: &str = "ws://localhost:8000/ws";

/// Live-refresh period when none is configured.
pub const DEFAULT_REFRESH_SECS: u64 = 10;

/// Runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// WebSocket address of the query service.
    pub address: String,

    /// Page size used until the user picks one (a stored preference wins).
    pub page_size: usize,

    /// Quiet interval before an edited filter set is queried.
    pub debounce_ms: u64,

    /// Re-query the current page every N seconds. `None` disables live refresh;
    /// a configured `0` maps to `None`.
    pub refresh_secs: Option<u64>,

    /// Tracing filter directive. Options: `trace`, `debug`, `info`, `warn`,
    /// `error`, or a full `EnvFilter` expression. Default: `"info"`
    pub trace_level: String,

    /// Directory for the trace file and the default preferences file.
    pub data_dir: PathBuf,

    /// Explicit preferences file. Defaults to `<data_dir>/preferences.json`.
    pub preferences_path: Option<PathBuf>,

    /// Built-in theme name or a path to a TOML theme file.
    pub theme: Option<String>,

    /// Accept replies without a request id when their echoed page size
    /// matches the pending request.
    pub legacy_correlation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            page_size: 50,
            debounce_ms: 300,
            refresh_secs: Some(DEFAULT_REFRESH_SECS),
            trace_level: "info".to_string(),
            data_dir: infrastructure::get_data_dir(),
            preferences_path: None,
            theme: None,
            legacy_correlation: false,
        }
    }
}

/// On-disk form of [`Config`]; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    address: Option<String>,
    page_size: Option<usize>,
    debounce_ms: Option<u64>,
    refresh_secs: Option<u64>,
    trace_level: Option<String>,
    data_dir: Option<String>,
    preferences: Option<String>,
    theme: Option<String>,
    legacy_correlation: Option<bool>,
}

impl Config {
    /// Parses configuration from a flat key/value map, starting from the
    /// defaults.
    ///
    /// Recognised keys: `address`, `page_size`, `debounce_ms`, `refresh_secs`,
    /// `trace_level`, `data_dir`, `preferences`, `theme`,
    /// `legacy_correlation`. Unknown keys are ignored with a debug log.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::Config`] when a numeric or boolean value does
    /// not parse, or the page size is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use flightdeck::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("page_size".to_string(), "100".to_string());
    /// map.insert("refresh_secs".to_string(), "5".to_string());
    ///
    /// let config = Config::from_map(&map)?;
    /// assert_eq!(config.page_size, 100);
    /// assert_eq!(config.refresh_secs, Some(5));
    /// # Ok::<(), flightdeck::FlightdeckError>(())
    /// ```
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut file = ConfigFile::default();
        for (key, value) in map {
            let value = value.trim();
            match key.as_str() {
                "address" => file.address = Some(value.to_string()),
                "page_size" => file.page_size = Some(parse_value(key, value)?),
                "debounce_ms" => file.debounce_ms = Some(parse_value(key, value)?),
                "refresh_secs" => file.refresh_secs = Some(parse_value(key, value)?),
                "trace_level" => file.trace_level = Some(value.to_string()),
                "data_dir" => file.data_dir = Some(value.to_string()),
                "preferences" => file.preferences = Some(value.to_string()),
                "theme" => file.theme = Some(value.to_string()),
                "legacy_correlation" => file.legacy_correlation = Some(parse_value(key, value)?),
                other => tracing::debug!(key = %other, "ignoring unknown config key"),
            }
        }

        let mut config = Self::default();
        config.merge(file)?;
        Ok(config)
    }

    /// Parses a TOML document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::Config`] for invalid TOML, unknown keys,
    /// wrongly typed values or a zero page size.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| FlightdeckError::Config(format!("invalid config file: {e}")))?;
        let mut config = Self::default();
        config.merge(file)?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise the errors of
    /// [`Config::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = ?path, "loading config file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn merge(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(address) = file.address {
            self.address = address;
        }
        if let Some(size) = file.page_size {
            if size == 0 {
                return Err(FlightdeckError::Config("page_size must be positive".into()));
            }
            self.page_size = size;
        }
        if let Some(ms) = file.debounce_ms {
            self.debounce_ms = ms;
        }
        if let Some(secs) = file.refresh_secs {
            self.refresh_secs = (secs > 0).then_some(secs);
        }
        if let Some(level) = file.trace_level {
            self.trace_level = level;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = infrastructure::expand_tilde(&dir);
        }
        if let Some(path) = file.preferences {
            self.preferences_path = Some(infrastructure::expand_tilde(&path));
        }
        if file.theme.is_some() {
            self.theme = file.theme;
        }
        if let Some(legacy) = file.legacy_correlation {
            self.legacy_correlation = legacy;
        }
        Ok(())
    }

    /// Where the preferences document lives.
    #[must_use]
    pub fn preferences_file(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("preferences.json"))
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_secs.map(Duration::from_secs)
    }

    /// Session tunables derived from this configuration.
    #[must_use]
    pub const fn session_options(&self) -> SessionOptions {
        SessionOptions {
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
            legacy_correlation: self.legacy_correlation,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| FlightdeckError::Config(format!("invalid value {value:?} for {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn defaults_match_reference_service() {
        let config = Config::default();
        assert_eq!(config.address, "ws://localhost:8000/ws");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(10)));
        assert!(!config.legacy_correlation);
        assert_eq!(config.preferences_file(), config.data_dir.join("preferences.json"));
    }

    #[test]
    fn map_values_override_defaults() {
        let config = Config::from_map(&map(&[
            ("address", "ws://flights.local/ws"),
            ("debounce_ms", "120"),
            ("legacy_correlation", "true"),
            ("preferences", "/tmp/prefs.json"),
            ("colour", "blue"),
        ]))
        .unwrap();

        assert_eq!(config.address, "ws://flights.local/ws");
        assert_eq!(config.debounce_ms, 120);
        assert!(config.legacy_correlation);
        assert_eq!(config.preferences_file(), PathBuf::from("/tmp/prefs.json"));
        assert_eq!(config.session_options().debounce, Duration::from_millis(120));
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let err = Config::from_map(&map(&[("page_size", "many")])).unwrap_err();
        assert!(matches!(err, FlightdeckError::Config(_)));

        let err = Config::from_map(&map(&[("page_size", "0")])).unwrap_err();
        assert!(matches!(err, FlightdeckError::Config(_)));
    }

    #[test]
    fn zero_refresh_disables_polling() {
        let config = Config::from_map(&map(&[("refresh_secs", "0")])).unwrap();
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn toml_file_is_layered_on_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flightdeck.toml");
        std::fs::write(&path, "page_size = 25\nrefresh_secs = 5\ntheme = \"mono\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(5)));
        assert_eq!(config.theme.as_deref(), Some("mono"));
        assert_eq!(config.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let err = Config::from_toml_str("pagesize = 25\n").unwrap_err();
        assert!(matches!(err, FlightdeckError::Config(_)));
    }
}
