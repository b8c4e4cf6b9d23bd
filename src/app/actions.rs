//! Actions representing side effects to be executed by the owning session.
//!
//! The event handler never touches the channel, the timers, or the preferences
//! store. It returns a `Vec<Action>` describing what should happen, and the
//! session (or any other runtime) carries the actions out in order.
//!
//! # Example
//!
//! ```rust
//! use flightdeck::app::{Action, PreferenceUpdate};
//!
//! let actions = vec![Action::SavePreference(PreferenceUpdate::PageSize(100))];
//! assert_eq!(actions.len(), 1);
//! ```

use crate::channel::ClientMessage;
use crate::domain::{Filters, SortModel, UnitSystem};
use std::time::Duration;

/// Commands produced by the handler for the session to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hands a query frame to the channel adapter (which queues it if the
    /// connection is not open yet).
    Send(ClientMessage),

    /// Arms the debounce timer for `generation`; when it elapses the runtime
    /// feeds back [`crate::app::Event::FiltersSettled`].
    ScheduleDebounce {
        /// Debounce generation the timer belongs to.
        generation: u64,
        /// Quiet interval to wait.
        delay: Duration,
    },

    /// Cancels every pending timer.
    CancelTimers,

    /// Persists a user preference.
    SavePreference(PreferenceUpdate),

    /// Closes the channel and discards unsent frames.
    CloseChannel,
}

/// A single preference write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceUpdate {
    Page(usize),
    PageSize(usize),
    Sort(Option<SortModel>),
    Filters(Filters),
    UnitSystem(UnitSystem),
}
