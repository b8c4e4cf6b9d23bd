//! Connection plumbing between a query session and the data service.
//!
//! - `messages`: JSON envelopes with request tokens and trace context
//! - `transport`: the [`Transport`] trait and its WebSocket and in-memory implementations
//! - `adapter`: send queue, readiness, and single-consumer inbound delivery

pub mod adapter;
pub mod messages;
pub mod transport;

pub use adapter::{ChannelAdapter, ChannelSignal, ConnectionState, MessageHandler};
pub use messages::{ClientMessage, RequestToken, ServerMessage, TraceContext};
pub use transport::{MemoryTransport, Transport, TransportEvent, WebSocketTransport};
