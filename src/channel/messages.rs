//! Wire protocol between the session and the data service.
//!
//! Every frame is one JSON object. Outgoing frames are [`ClientMessage`]s: a
//! [`QueryRequest`] plus the request token that identifies it. Incoming frames
//! are [`ServerMessage`]s: a [`QueryResponse`] plus the echoed token. The token
//! is what lets the session tell the answer to its latest request apart from
//! the late answer to a superseded one.
//!
//! Outgoing frames also carry the caller's tracing context so a service that
//! understands it can join the client's trace.

use crate::domain::{FlightdeckError, QueryRequest, QueryResponse, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing identifier attached to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

impl RequestToken {
    /// The token after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Distributed tracing context for cross-process span propagation.
///
/// Captures the current trace and span IDs from OpenTelemetry so the service
/// side can be stitched into the same trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking spans across processes.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Creates a trace context from the current tracing span.
    ///
    /// Returns `None` if the current span context is invalid or not sampled,
    /// which is always the case when tracing has not been initialized.
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let span = tracing::Span::current();
        let otel_context = span.context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if span_context.is_valid() {
            Some(Self {
                trace_id: format!("{:032x}", span_context.trace_id()),
                parent_span_id: format!("{:016x}", span_context.span_id()),
            })
        } else {
            None
        }
    }
}

/// A query frame sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub request_id: RequestToken,

    #[serde(flatten)]
    pub query: QueryRequest,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace_context: Option<TraceContext>,
}

impl ClientMessage {
    /// Wraps `query` under `token`, attaching the current trace context.
    #[must_use]
    pub fn query(token: RequestToken, query: QueryRequest) -> Self {
        Self {
            request_id: token,
            query,
            trace_context: TraceContext::from_current(),
        }
    }

    /// Serializes the frame as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::Serialization`] if encoding fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A reply frame received from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Echo of the request token; absent from services that predate tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestToken>,

    #[serde(flatten)]
    pub response: QueryResponse,
}

impl ServerMessage {
    #[must_use]
    pub const fn reply(token: RequestToken, response: QueryResponse) -> Self {
        Self {
            request_id: Some(token),
            response,
        }
    }

    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::Serialization`] for invalid JSON or a wrong
    /// shape, and [`FlightdeckError::Transport`] for a frame that carries
    /// neither a result count nor an error.
    pub fn decode(text: &str) -> Result<Self> {
        let message: Self = serde_json::from_str(text)?;
        if !message.response.is_well_formed() {
            return Err(FlightdeckError::Transport(
                "reply carries neither results_count nor error".to_string(),
            ));
        }
        Ok(message)
    }

    /// Serializes the frame as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::Serialization`] if encoding fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cursor, Filters, Row};

    #[test]
    fn client_frame_flattens_query_beside_token() {
        let message = ClientMessage {
            request_id: RequestToken(7),
            query: QueryRequest::new(Filters::new(), None, 50, None),
            trace_context: None,
        };
        let json: serde_json::Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"request_id": 7, "filters": {}, "page_size": 50, "cursor": null})
        );
    }

    #[test]
    fn decodes_reference_service_reply() {
        let text = r#"{
            "results_count": 5000,
            "page_size": 50,
            "next_cursor": 1234,
            "results": [{"id": 1, "icao24": "3c6444"}],
            "request_id": 3
        }"#;
        let message = ServerMessage::decode(text).unwrap();
        assert_eq!(message.request_id, Some(RequestToken(3)));
        assert_eq!(message.response.results_count, Some(5000));
        assert_eq!(message.response.next_cursor, Some(Cursor::Number(1234)));
        assert_eq!(message.response.results[0].id().as_deref(), Some("1"));
    }

    #[test]
    fn decodes_untokened_error_reply() {
        let message = ServerMessage::decode(r#"{"error": "no such column: speed"}"#).unwrap();
        assert_eq!(message.request_id, None);
        assert_eq!(message.response.error.as_deref(), Some("no such column: speed"));
    }

    #[test]
    fn rejects_garbage_and_empty_frames() {
        assert!(ServerMessage::decode("not json").is_err());
        assert!(ServerMessage::decode("[1, 2]").is_err());
        assert!(ServerMessage::decode("{}").is_err());
    }

    #[test]
    fn reply_encodes_and_decodes() {
        let original = ServerMessage::reply(
            RequestToken(9),
            QueryResponse::page(vec![Row::new()], 1, Some("c9".into())),
        );
        let decoded = ServerMessage::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }
}
