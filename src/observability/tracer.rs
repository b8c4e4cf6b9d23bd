//! Tracer provider whose spans go to a rotating OTLP-JSON file.

use super::file_writer::{RotatingFile, RotationPolicy};
use super::span_formatter::SpanFormatter;
use futures_util::future::BoxFuture;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::{Config, TracerProvider};
use std::path::PathBuf;

/// Span exporter writing one OTLP document per batch, one per line.
struct OtlpFileExporter {
    file: RotatingFile,
    formatter: SpanFormatter,
    stopped: bool,
}

impl OtlpFileExporter {
    fn write(&self, batch: &[SpanData]) -> ExportResult {
        if self.stopped {
            return Err(TraceError::from("exporter is shut down"));
        }
        let line = serde_json::to_string(&self.formatter.format_batch(batch))
            .map_err(|e| TraceError::from(e.to_string()))?;
        self.file
            .write_line(&line)
            .map_err(|e| TraceError::from(e.to_string()))
    }
}

impl SpanExporter for OtlpFileExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = self.write(&batch);
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.stopped = true;
    }
}

impl std::fmt::Debug for OtlpFileExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtlpFileExporter")
            .field("file", &self.file)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

/// Builds a provider that exports every finished span straight to `file_path`.
pub fn file_tracer_provider(file_path: PathBuf, resource: Resource) -> TracerProvider {
    let exporter = OtlpFileExporter {
        file: RotatingFile::new(file_path, RotationPolicy::default()),
        formatter: SpanFormatter::new(resource.clone()),
        stopped: false,
    };

    TracerProvider::builder()
        .with_config(Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}
