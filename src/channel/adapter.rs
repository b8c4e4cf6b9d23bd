//! Channel adapter: one logical connection with a send queue and a single
//! inbound consumer.
//!
//! Frames sent before the connection opens wait in a FIFO queue and are
//! flushed in call order the moment the transport reports [`TransportEvent::Opened`].
//! Every inbound frame that decodes into a [`ServerMessage`] goes to the one
//! registered handler; anything else is logged and dropped without touching
//! the connection.

use crate::channel::messages::{ClientMessage, ServerMessage};
use crate::channel::transport::{Transport, TransportEvent};
use crate::domain::{FlightdeckError, Result};
use std::collections::VecDeque;
use tokio::sync::watch;

/// Consumer of decoded inbound messages.
pub type MessageHandler = Box<dyn FnMut(ServerMessage)>;

/// Connection lifecycle as seen by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, or the last one went away. Sends are queued.
    Disconnected,
    /// A transport is attached but has not opened yet. Sends are queued.
    Connecting,
    /// Sends go straight to the transport.
    Open,
    /// Torn down; sends fail and events are ignored.
    Closed,
}

/// What a transport event meant, for the owner of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSignal {
    /// The connection opened and the queue was flushed.
    Connected,
    /// The connection was lost or failed to open.
    Disconnected,
    /// One decoded message went to the handler.
    Delivered,
    /// An inbound frame was malformed or had no consumer.
    Dropped,
    /// The event did not change anything.
    Ignored,
}

pub struct ChannelAdapter<T: Transport> {
    address: Option<String>,
    transport: Option<T>,
    state: ConnectionState,
    queue: VecDeque<String>,
    handler: Option<MessageHandler>,
    ready: watch::Sender<bool>,
}

impl<T: Transport> Default for ChannelAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ChannelAdapter<T> {
    #[must_use]
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            address: None,
            transport: None,
            state: ConnectionState::Disconnected,
            queue: VecDeque::new(),
            handler: None,
            ready,
        }
    }

    /// Attaches `transport`, which is expected to be connecting to `address`.
    ///
    /// A previously attached transport is closed first. Frames already queued
    /// stay queued and go out once the new transport opens.
    pub fn connect(&mut self, address: &str, transport: T) {
        if let Some(mut previous) = self.transport.take() {
            tracing::debug!(previous = ?self.address, "replacing existing connection");
            previous.close();
        }

        tracing::info!(address = %address, queued = self.queue.len(), "connecting");
        self.address = Some(address.to_string());
        self.transport = Some(transport);
        self.set_state(ConnectionState::Connecting);
    }

    /// Sends `message`, or queues it when the connection is not open yet.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::SessionClosed`] after teardown, a
    /// serialization error if the frame cannot be encoded, or
    /// [`FlightdeckError::Transport`] if an open transport refuses the frame.
    /// A refused frame is not re-queued and the adapter drops to
    /// [`ConnectionState::Disconnected`].
    pub fn send(&mut self, message: &ClientMessage) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(FlightdeckError::SessionClosed);
        }

        let frame = message.encode()?;
        let transport = match self.transport.as_mut() {
            Some(transport) if self.state == ConnectionState::Open => transport,
            _ => {
                tracing::debug!(
                    request_id = %message.request_id,
                    state = ?self.state,
                    queued = self.queue.len() + 1,
                    "connection not ready, queueing query"
                );
                self.queue.push_back(frame);
                return Ok(());
            }
        };

        tracing::debug!(request_id = %message.request_id, "sending query");
        if let Err(e) = transport.send_text(frame) {
            tracing::warn!(error = %e, request_id = %message.request_id, "send failed");
            self.transport = None;
            self.set_state(ConnectionState::Disconnected);
            return Err(e);
        }
        Ok(())
    }

    /// Registers the consumer for inbound messages, replacing any previous one.
    pub fn on_message(&mut self, handler: impl FnMut(ServerMessage) + 'static) {
        if self.handler.is_some() {
            tracing::warn!("replacing existing message handler");
        }
        self.handler = Some(Box::new(handler));
    }

    /// Feeds one transport event through the adapter.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> ChannelSignal {
        if self.state == ConnectionState::Closed {
            tracing::trace!(event = ?event, "event after teardown ignored");
            return ChannelSignal::Ignored;
        }

        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Text(text) => self.deliver(&text),
            TransportEvent::Closed { reason } => {
                tracing::info!(reason = ?reason, "connection closed");
                self.on_lost()
            }
            TransportEvent::Failed(error) => {
                tracing::warn!(error = %error, "connection failed");
                self.on_lost()
            }
        }
    }

    fn on_open(&mut self) -> ChannelSignal {
        let Some(transport) = self.transport.as_mut() else {
            tracing::warn!("open reported without a transport");
            return ChannelSignal::Ignored;
        };

        let flushed = self.queue.len();
        while let Some(frame) = self.queue.pop_front() {
            if let Err(e) = transport.send_text(frame) {
                tracing::warn!(error = %e, "flush failed, discarding queue");
                self.queue.clear();
                self.transport = None;
                self.set_state(ConnectionState::Disconnected);
                return ChannelSignal::Disconnected;
            }
        }

        tracing::info!(flushed, "connection open");
        self.set_state(ConnectionState::Open);
        ChannelSignal::Connected
    }

    fn on_lost(&mut self) -> ChannelSignal {
        self.transport = None;
        if self.state == ConnectionState::Disconnected {
            return ChannelSignal::Ignored;
        }
        self.set_state(ConnectionState::Disconnected);
        ChannelSignal::Disconnected
    }

    fn deliver(&mut self, text: &str) -> ChannelSignal {
        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, bytes = text.len(), "dropping malformed frame");
                return ChannelSignal::Dropped;
            }
        };

        match self.handler.as_mut() {
            Some(handler) => {
                handler(message);
                ChannelSignal::Delivered
            }
            None => {
                tracing::warn!("no message handler registered, dropping frame");
                ChannelSignal::Dropped
            }
        }
    }

    /// Closes the connection and discards unsent frames. Further sends fail.
    pub fn teardown(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        if !self.queue.is_empty() {
            tracing::debug!(discarded = self.queue.len(), "discarding unsent frames");
            self.queue.clear();
        }
        self.handler = None;
        self.set_state(ConnectionState::Closed);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Open
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Readiness as an observable value.
    #[must_use]
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Number of frames waiting for the connection to open.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.ready.send_replace(state == ConnectionState::Open);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::messages::RequestToken;
    use crate::channel::transport::MemoryTransport;
    use crate::domain::{Filters, QueryRequest, QueryResponse};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn query(token: u64) -> ClientMessage {
        ClientMessage {
            request_id: RequestToken(token),
            query: QueryRequest::new(Filters::new(), None, 50, None),
            trace_context: None,
        }
    }

    fn sent_tokens(transport: &MemoryTransport) -> Vec<u64> {
        transport
            .sent()
            .iter()
            .map(|f| serde_json::from_str::<ClientMessage>(f).unwrap().request_id.0)
            .collect()
    }

    #[test]
    fn queued_sends_flush_once_in_order() {
        let wire = MemoryTransport::new();
        let mut adapter = ChannelAdapter::new();
        adapter.connect("ws://test", wire.clone());

        adapter.send(&query(1)).unwrap();
        adapter.send(&query(2)).unwrap();
        assert!(wire.sent().is_empty());
        assert_eq!(adapter.queued(), 2);

        assert_eq!(adapter.handle_transport_event(TransportEvent::Opened), ChannelSignal::Connected);
        adapter.send(&query(3)).unwrap();

        assert_eq!(sent_tokens(&wire), vec![1, 2, 3]);
        assert_eq!(adapter.queued(), 0);
    }

    #[test]
    fn readiness_is_observable() {
        let mut adapter = ChannelAdapter::new();
        let rx = adapter.subscribe_ready();
        adapter.connect("ws://test", MemoryTransport::new());
        assert!(!*rx.borrow());

        adapter.handle_transport_event(TransportEvent::Opened);
        assert!(*rx.borrow());
        assert!(adapter.is_ready());

        adapter.handle_transport_event(TransportEvent::Closed { reason: None });
        assert!(!*rx.borrow());
        assert_eq!(adapter.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn malformed_frames_are_dropped_and_connection_survives() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);

        let mut adapter = ChannelAdapter::new();
        adapter.on_message(move |m| sink.borrow_mut().push(m));
        adapter.connect("ws://test", MemoryTransport::new());
        adapter.handle_transport_event(TransportEvent::Opened);

        let bad = adapter.handle_transport_event(TransportEvent::Text("{oops".into()));
        let good_frame = ServerMessage::reply(RequestToken(1), QueryResponse::page(vec![], 0, None))
            .encode()
            .unwrap();
        let good = adapter.handle_transport_event(TransportEvent::Text(good_frame));

        assert_eq!(bad, ChannelSignal::Dropped);
        assert_eq!(good, ChannelSignal::Delivered);
        assert_eq!(received.borrow().len(), 1);
        assert!(adapter.is_ready());
    }

    #[test]
    fn second_handler_replaces_first() {
        let hits = Rc::new(RefCell::new((0, 0)));
        let (a, b) = (Rc::clone(&hits), Rc::clone(&hits));

        let mut adapter = ChannelAdapter::<MemoryTransport>::new();
        adapter.on_message(move |_| a.borrow_mut().0 += 1);
        adapter.on_message(move |_| b.borrow_mut().1 += 1);

        let frame = ServerMessage::reply(RequestToken(1), QueryResponse::failure("x"))
            .encode()
            .unwrap();
        adapter.handle_transport_event(TransportEvent::Text(frame));
        assert_eq!(*hits.borrow(), (0, 1));
    }

    #[test]
    fn teardown_closes_and_discards_queue() {
        let wire = MemoryTransport::new();
        let mut adapter = ChannelAdapter::new();
        adapter.connect("ws://test", wire.clone());
        adapter.send(&query(1)).unwrap();

        adapter.teardown();

        assert!(wire.is_closed());
        assert!(wire.sent().is_empty());
        assert_eq!(adapter.queued(), 0);
        assert!(matches!(adapter.send(&query(2)), Err(FlightdeckError::SessionClosed)));
        assert_eq!(adapter.handle_transport_event(TransportEvent::Opened), ChannelSignal::Ignored);
    }

    #[test]
    fn send_failure_marks_adapter_disconnected() {
        let wire = MemoryTransport::new();
        let mut adapter = ChannelAdapter::new();
        adapter.connect("ws://test", wire.clone());
        adapter.handle_transport_event(TransportEvent::Opened);

        wire.set_failing(true);
        assert!(adapter.send(&query(1)).is_err());
        assert_eq!(adapter.state(), ConnectionState::Disconnected);
        assert_eq!(adapter.queued(), 0);

        // Later sends wait for the next connection.
        adapter.send(&query(2)).unwrap();
        assert_eq!(adapter.queued(), 1);
    }

    #[test]
    fn reconnect_closes_previous_transport() {
        let first = MemoryTransport::new();
        let second = MemoryTransport::new();
        let mut adapter = ChannelAdapter::new();

        adapter.connect("ws://one", first.clone());
        adapter.handle_transport_event(TransportEvent::Opened);
        adapter.connect("ws://two", second.clone());

        assert!(first.is_closed());
        assert_eq!(adapter.state(), ConnectionState::Connecting);
        assert_eq!(adapter.address(), Some("ws://two"));
    }
}
