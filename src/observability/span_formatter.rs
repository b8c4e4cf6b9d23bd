//! OTLP JSON encoding for exported spans.
//!
//! Each export batch becomes one OTLP/JSON `TracesData` document, so the
//! trace file can be fed line by line to any collector or viewer that reads
//! the OTLP file format.

use opentelemetry::trace::{SpanId, SpanKind, Status};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::resource::Resource;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Instrumentation scope reported for every span.
const SCOPE_NAME: &str = "flightdeck";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracesDocument {
    resource_spans: Vec<ResourceSpans>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSpans {
    resource: ResourceJson,
    scope_spans: Vec<ScopeSpans>,
}

#[derive(Debug, Serialize)]
struct ResourceJson {
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
struct ScopeSpans {
    scope: Scope,
    spans: Vec<SpanJson>,
}

#[derive(Debug, Serialize)]
struct Scope {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpanJson {
    trace_id: String,
    span_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    parent_span_id: String,
    name: String,
    kind: u8,
    start_time_unix_nano: String,
    end_time_unix_nano: String,
    attributes: Vec<Attribute>,
    events: Vec<EventJson>,
    links: Vec<LinkJson>,
    status: StatusJson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventJson {
    time_unix_nano: String,
    name: String,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkJson {
    trace_id: String,
    span_id: String,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
struct StatusJson {
    code: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
}

#[derive(Debug, Serialize)]
struct Attribute {
    key: String,
    value: AnyValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum AnyValue {
    BoolValue(bool),
    /// OTLP/JSON encodes 64-bit integers as strings.
    IntValue(String),
    DoubleValue(f64),
    StringValue(String),
}

impl From<&Value> for AnyValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::BoolValue(*b),
            Value::I64(i) => Self::IntValue(i.to_string()),
            Value::F64(f) => Self::DoubleValue(*f),
            Value::String(s) => Self::StringValue(s.to_string()),
            Value::Array(_) => Self::StringValue(value.to_string()),
        }
    }
}

fn attribute(key: &str, value: &Value) -> Attribute {
    Attribute {
        key: key.to_string(),
        value: AnyValue::from(value),
    }
}

fn attributes(pairs: &[KeyValue]) -> Vec<Attribute> {
    pairs.iter().map(|kv| attribute(kv.key.as_str(), &kv.value)).collect()
}

fn unix_nanos(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .to_string()
}

const fn kind_code(kind: &SpanKind) -> u8 {
    match kind {
        SpanKind::Internal => 1,
        SpanKind::Server => 2,
        SpanKind::Client => 3,
        SpanKind::Producer => 4,
        SpanKind::Consumer => 5,
    }
}

fn status(status: &Status) -> StatusJson {
    match status {
        Status::Unset => StatusJson { code: 0, message: String::new() },
        Status::Ok => StatusJson { code: 1, message: String::new() },
        Status::Error { description } => StatusJson {
            code: 2,
            message: description.to_string(),
        },
    }
}

fn span(data: &SpanData) -> SpanJson {
    let parent_span_id = if data.parent_span_id == SpanId::INVALID {
        String::new()
    } else {
        format!("{:016x}", data.parent_span_id)
    };

    SpanJson {
        trace_id: format!("{:032x}", data.span_context.trace_id()),
        span_id: format!("{:016x}", data.span_context.span_id()),
        parent_span_id,
        name: data.name.to_string(),
        kind: kind_code(&data.span_kind),
        start_time_unix_nano: unix_nanos(data.start_time),
        end_time_unix_nano: unix_nanos(data.end_time),
        attributes: attributes(&data.attributes),
        events: data
            .events
            .iter()
            .map(|e| EventJson {
                time_unix_nano: unix_nanos(e.timestamp),
                name: e.name.to_string(),
                attributes: attributes(&e.attributes),
            })
            .collect(),
        links: data
            .links
            .iter()
            .map(|l| LinkJson {
                trace_id: format!("{:032x}", l.span_context.trace_id()),
                span_id: format!("{:016x}", l.span_context.span_id()),
                attributes: attributes(&l.attributes),
            })
            .collect(),
        status: status(&data.status),
    }
}

/// Builds OTLP documents for one resource.
pub struct SpanFormatter {
    resource: Resource,
}

impl SpanFormatter {
    pub const fn new(resource: Resource) -> Self {
        Self { resource }
    }

    pub fn format_batch(&self, batch: &[SpanData]) -> TracesDocument {
        let resource = ResourceJson {
            attributes: self
                .resource
                .iter()
                .map(|(k, v)| attribute(k.as_str(), v))
                .collect(),
        };

        TracesDocument {
            resource_spans: vec![ResourceSpans {
                resource,
                scope_spans: vec![ScopeSpans {
                    scope: Scope {
                        name: SCOPE_NAME,
                        version: env!("CARGO_PKG_VERSION"),
                    },
                    spans: batch.iter().map(span).collect(),
                }],
            }],
        }
    }
}

impl std::fmt::Debug for SpanFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanFormatter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_carries_resource_and_scope() {
        let resource = Resource::new(vec![KeyValue::new("service.name", "flightdeck")]);
        let doc = SpanFormatter::new(resource).format_batch(&[]);
        let json = serde_json::to_value(&doc).unwrap();

        let rs = &json["resourceSpans"][0];
        let attrs = rs["resource"]["attributes"].as_array().unwrap();
        assert!(attrs.iter().any(|a| a["key"] == "service.name"
            && a["value"]["stringValue"] == "flightdeck"));
        assert_eq!(rs["scopeSpans"][0]["scope"]["name"], "flightdeck");
        assert_eq!(rs["scopeSpans"][0]["spans"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn integers_are_encoded_as_strings() {
        let value = serde_json::to_value(AnyValue::from(&Value::I64(42))).unwrap();
        assert_eq!(value, serde_json::json!({"intValue": "42"}));
    }
}
