//! Transport collaborators for the channel adapter.
//!
//! A transport moves text frames and reports lifecycle changes. It knows
//! nothing about queries: the adapter above it owns buffering, decoding and
//! delivery. Lifecycle changes arrive as [`TransportEvent`]s on a channel the
//! owner drains, so the transport never calls back into session state.
//!
//! - [`WebSocketTransport`]: `tokio-tungstenite` client driven by one task
//! - [`MemoryTransport`]: records frames in memory, for tests and dry runs

use crate::domain::{FlightdeckError, Result};
use futures_util::{SinkExt, StreamExt};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::Instrument;

/// Lifecycle notification or inbound frame from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is open; queued frames may be flushed.
    Opened,
    /// One inbound text frame, undecoded.
    Text(String),
    /// The peer closed the connection.
    Closed { reason: Option<String> },
    /// The connection could not be established or broke.
    Failed(String),
}

/// Minimal outbound contract the adapter relies on.
pub trait Transport {
    /// Queues one text frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`FlightdeckError::Transport`] if the connection is gone.
    fn send_text(&mut self, text: String) -> Result<()>;

    /// Starts a graceful close. Idempotent.
    fn close(&mut self);
}

/// WebSocket client transport.
///
/// All socket I/O happens on a spawned task; this handle only feeds it
/// outgoing frames. Dropping the handle (or calling [`Transport::close`])
/// makes the task send a normal close frame and exit.
pub struct WebSocketTransport {
    outgoing: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    /// Starts connecting to `address`. Progress is reported on `events`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn open(address: &str, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let span = tracing::debug_span!("websocket", address = %address);
        let task = tokio::spawn(run_connection(address.to_string(), outgoing_rx, events).instrument(span));

        Self {
            outgoing: Some(outgoing),
            task: Some(task),
        }
    }
}

impl Transport for WebSocketTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        let outgoing = self
            .outgoing
            .as_ref()
            .ok_or_else(|| FlightdeckError::Transport("transport already closed".to_string()))?;

        outgoing
            .send(text)
            .map_err(|_| FlightdeckError::Transport("connection task has exited".to_string()))
    }

    fn close(&mut self) {
        if self.outgoing.take().is_some() {
            tracing::debug!("closing websocket transport");
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
        // The task exits on its own once it notices the closed channel.
        drop(self.task.take());
    }
}

async fn run_connection(
    address: String,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let mut early = Vec::new();
    let connect = connect_async(address.as_str());
    tokio::pin!(connect);

    let ws_stream = loop {
        tokio::select! {
            biased;
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    tracing::warn!(error = %e, "websocket connect failed");
                    let _ = events.send(TransportEvent::Failed(e.to_string()));
                    return;
                }
            },
            frame = outgoing.recv() => match frame {
                Some(text) => early.push(text),
                None => {
                    tracing::debug!("transport closed before connecting");
                    return;
                }
            },
        }
    };

    tracing::info!("websocket connected");
    let (mut sink, mut stream) = ws_stream.split();
    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    for text in early {
        if let Err(e) = sink.send(Message::Text(text)).await {
            let _ = events.send(TransportEvent::Failed(e.to_string()));
            return;
        }
    }

    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(error = %e, "websocket send failed");
                        let _ = events.send(TransportEvent::Failed(e.to_string()));
                        break;
                    }
                }
                None => {
                    let close = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client closed".into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(close))).await {
                        tracing::debug!(error = %e, "close frame not delivered");
                    }
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Text(text)).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map(|f| f.reason.into_owned()).filter(|r| !r.is_empty());
                    tracing::info!(reason = ?reason, "websocket closed by peer");
                    let _ = events.send(TransportEvent::Closed { reason });
                    break;
                }
                Some(Ok(other)) => {
                    tracing::trace!(kind = ?other, "ignoring non-text frame");
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "websocket read failed");
                    let _ = events.send(TransportEvent::Failed(e.to_string()));
                    break;
                }
                None => {
                    let _ = events.send(TransportEvent::Closed { reason: None });
                    break;
                }
            },
        }
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    sent: Vec<String>,
    closed: bool,
    failing: bool,
}

/// In-memory transport that records every frame.
///
/// Clones share the same log, so a test can keep one handle while the
/// adapter owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    log: Rc<RefCell<MemoryLog>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.log.borrow().sent.clone()
    }

    /// Removes and returns the recorded frames.
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.log.borrow_mut().sent)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.log.borrow().closed
    }

    /// Makes every following send fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.log.borrow_mut().failing = failing;
    }
}

impl Transport for MemoryTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.closed {
            return Err(FlightdeckError::Transport("transport already closed".to_string()));
        }
        if log.failing {
            return Err(FlightdeckError::Transport("simulated send failure".to_string()));
        }
        log.sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}
