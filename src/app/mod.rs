//! Application layer: the query coordinator.
//!
//! This module sits between the session runtime and the domain types. It owns
//! the coordinator's state machine and everything the state machine needs,
//! and nothing here performs I/O.
//!
//! # Architecture
//!
//! ```text
//! Display / Channel / Timers → Event → handle_event → SessionState → Actions
//!                                                          │
//!                                                          └→ ViewState → ViewStore
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects emitted by the handler
//! - [`debounce`]: Quiet-interval debouncer for filter input
//! - [`handler`]: Event processing and state transitions
//! - [`ledger`]: Page index to cursor mapping
//! - [`modes`]: Coordinator phase
//! - [`state`]: Session state container
//! - [`view`]: Observable view state for the display layer

pub mod actions;
pub mod debounce;
pub mod handler;
pub mod ledger;
pub mod modes;
pub mod state;
pub mod view;

pub use actions::{Action, PreferenceUpdate};
pub use debounce::{DebounceTicket, Debouncer};
pub use handler::{handle_event, Event};
pub use ledger::CursorLedger;
pub use modes::SessionPhase;
pub use state::{Correlation, SessionState};
pub use view::{ViewState, ViewStore};
