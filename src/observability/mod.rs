//! OpenTelemetry-based observability with file-based trace export.
//!
//! Spans and events from `tracing` are turned into OpenTelemetry spans and
//! written to a local file in OTLP/JSON form, one batch per line:
//!
//! ```text
//! tracing → tracing-opentelemetry → opentelemetry_sdk → OtlpFileExporter → RotatingFile
//! ```
//!
//! The file lives at `<data_dir>/flightdeck-otlp.json` and rotates at 10 MB,
//! keeping three backups. The level comes from `Config::trace_level`
//! (`--trace-level`), defaulting to `info`.
//!
//! # Modules
//!
//! - [`init`]: subscriber setup
//! - `tracer`: tracer provider and file span exporter
//! - `span_formatter`: OTLP/JSON document encoding
//! - `file_writer`: size-rotated line writer

mod file_writer;
pub mod init;
mod span_formatter;
mod tracer;

pub use init::{init_tracing, TRACE_FILE_NAME};
