//! Tracing subscriber setup.

use super::tracer;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the trace file inside the data directory.
pub const TRACE_FILE_NAME: &str = "flightdeck-otlp.json";

/// Installs the global subscriber: an `EnvFilter` at `config.trace_level`
/// feeding an OpenTelemetry layer that exports to
/// `<data_dir>/flightdeck-otlp.json`.
///
/// Never fails: if the data directory cannot be created, or a subscriber is
/// already installed, the program simply runs without trace export.
///
/// # Example
///
/// ```rust
/// use flightdeck::observability::init_tracing;
/// use flightdeck::Config;
///
/// let dir = std::env::temp_dir().join("flightdeck-doc-trace");
/// let config = Config {
///     trace_level: "debug".to_string(),
///     data_dir: dir,
///     ..Config::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    if std::fs::create_dir_all(&config.data_dir).is_err() {
        return;
    }

    let resource = Resource::new(vec![
        KeyValue::new("service.name", "flightdeck"),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = tracer::file_tracer_provider(config.data_dir.join(TRACE_FILE_NAME), resource);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer("flightdeck"));

    let filter = EnvFilter::try_new(&config.trace_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init();
}
