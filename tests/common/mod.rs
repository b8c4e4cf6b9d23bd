//! Shared fixtures for the session integration tests.

#![allow(dead_code)]

use flightdeck::channel::{ClientMessage, MemoryTransport, RequestToken, ServerMessage, TransportEvent};
use flightdeck::domain::{Cursor, FieldValue, QueryResponse, Row};
use flightdeck::session::{ManualTimers, QuerySession, SessionOptions};
use flightdeck::storage::{MemoryPreferences, Preferences};

pub type TestSession<P = MemoryPreferences> = QuerySession<MemoryTransport, ManualTimers, P>;

pub const ADDRESS: &str = "ws://localhost:8000/ws";

/// A session over a recording transport that has not opened yet.
pub fn connecting_session_with<P: Preferences>(
    options: SessionOptions,
    preferences: P,
) -> (TestSession<P>, MemoryTransport, ManualTimers) {
    let transport = MemoryTransport::new();
    let timers = ManualTimers::new();
    let mut session = QuerySession::new(options, timers.clone(), preferences).unwrap();
    session.connect(ADDRESS, transport.clone()).unwrap();
    (session, transport, timers)
}

pub fn connecting_session() -> (TestSession, MemoryTransport, ManualTimers) {
    connecting_session_with(SessionOptions::default(), MemoryPreferences::new())
}

/// A session whose connection is open and whose first-page query went out.
pub fn open_session() -> (TestSession, MemoryTransport, ManualTimers) {
    let (mut session, transport, timers) = connecting_session();
    session.handle_transport_event(TransportEvent::Opened).unwrap();
    (session, transport, timers)
}

/// Decodes and drains every frame the transport sent.
pub fn drain_sent(transport: &MemoryTransport) -> Vec<ClientMessage> {
    transport
        .take_sent()
        .iter()
        .map(|frame| serde_json::from_str(frame).unwrap())
        .collect()
}

/// The single frame sent since the last drain.
pub fn only_sent(transport: &MemoryTransport) -> ClientMessage {
    let mut sent = drain_sent(transport);
    assert_eq!(sent.len(), 1, "expected exactly one frame, got {sent:?}");
    sent.remove(0)
}

pub fn rows(prefix: &str, n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new()
                .with("id", FieldValue::Number(serde_json::Number::from(i)))
                .with("callsign", FieldValue::Text(format!("{prefix}{i}")))
        })
        .collect()
}

pub fn page(rows: Vec<Row>, count: u64, next: Option<&str>) -> QueryResponse {
    QueryResponse::page(rows, count, next.map(Cursor::from))
}

/// Delivers `response` as an inbound text frame answering `token`.
pub fn deliver<P: Preferences>(session: &mut TestSession<P>, token: RequestToken, response: QueryResponse) {
    let frame = ServerMessage::reply(token, response).encode().unwrap();
    session.handle_transport_event(TransportEvent::Text(frame)).unwrap();
}

pub fn first_callsign<P: Preferences>(session: &TestSession<P>) -> Option<String> {
    session
        .view()
        .snapshot()
        .rows
        .first()
        .and_then(|row| row.get("callsign"))
        .map(ToString::to_string)
}
