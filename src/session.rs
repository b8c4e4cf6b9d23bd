//! The query session: one coordinator, one connection, one view.
//!
//! A [`QuerySession`] is built per active table view and torn down explicitly.
//! It owns the [`SessionState`], the [`ChannelAdapter`], the [`ViewStore`] the
//! display reads, a [`TimerScheduler`] for debounce expiries, and the
//! preferences handle. Every input (user intent, transport event, timer fire)
//! becomes an [`Event`] for [`handle_event`], and the returned [`Action`]s are
//! carried out here, in order, before the next input is looked at.
//!
//! Inbound replies reach the coordinator by message passing: the adapter's
//! handler only posts into a queue, and the session drains that queue after
//! each transport event.
//!
//! # Example
//!
//! ```rust
//! use flightdeck::channel::{MemoryTransport, TransportEvent};
//! use flightdeck::session::{ManualTimers, QuerySession, SessionOptions};
//! use flightdeck::storage::MemoryPreferences;
//!
//! let mut session = QuerySession::new(
//!     SessionOptions::default(),
//!     ManualTimers::new(),
//!     MemoryPreferences::new(),
//! )?;
//! let transport = MemoryTransport::new();
//! session.connect("ws://localhost:8000/ws", transport.clone())?;
//! session.handle_transport_event(TransportEvent::Opened)?;
//!
//! assert_eq!(transport.sent().len(), 1);
//! assert!(session.view().snapshot().is_loading);
//! session.teardown()?;
//! # Ok::<(), flightdeck::domain::FlightdeckError>(())
//! ```

use crate::app::{handle_event, Action, Event, PreferenceUpdate, SessionState, ViewStore};
use crate::channel::{ChannelAdapter, ChannelSignal, ConnectionState, ServerMessage, Transport, TransportEvent};
use crate::domain::fields::is_known_field;
use crate::domain::{FilterPatch, FlightdeckError, Result, SortModel, SortOrder, UnitSystem};
use crate::storage::{PreferenceKey, Preferences, PreferencesExt};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Arms and cancels debounce timers on behalf of a session.
///
/// When a timer for `generation` elapses, the runtime must call
/// [`QuerySession::handle_timer`] with that generation.
pub trait TimerScheduler {
    fn schedule(&mut self, generation: u64, delay: Duration);

    /// Cancels every pending timer.
    fn cancel_all(&mut self);
}

#[derive(Debug, Default)]
struct TimerLog {
    scheduled: Vec<(u64, Duration)>,
    cancellations: usize,
}

/// Scheduler that only records requests; the caller fires timers by hand.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ManualTimers {
    log: Rc<RefCell<TimerLog>>,
}

impl ManualTimers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(generation, delay)` scheduled so far.
    #[must_use]
    pub fn scheduled(&self) -> Vec<(u64, Duration)> {
        self.log.borrow().scheduled.clone()
    }

    /// Generation of the most recently scheduled timer.
    #[must_use]
    pub fn last_generation(&self) -> Option<u64> {
        self.log.borrow().scheduled.last().map(|(g, _)| *g)
    }

    #[must_use]
    pub fn cancellations(&self) -> usize {
        self.log.borrow().cancellations
    }
}

impl TimerScheduler for ManualTimers {
    fn schedule(&mut self, generation: u64, delay: Duration) {
        self.log.borrow_mut().scheduled.push((generation, delay));
    }

    fn cancel_all(&mut self) {
        self.log.borrow_mut().cancellations += 1;
    }
}

/// Tunables for a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Page size used when no preference is stored.
    pub page_size: usize,
    pub debounce: Duration,
    pub legacy_correlation: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            debounce: Duration::from_millis(300),
            legacy_correlation: false,
        }
    }
}

pub struct QuerySession<T: Transport, S: TimerScheduler, P: Preferences> {
    state: SessionState,
    channel: ChannelAdapter<T>,
    inbox: mpsc::UnboundedReceiver<ServerMessage>,
    view: ViewStore,
    timers: S,
    preferences: P,
}

impl<T: Transport, S: TimerScheduler, P: Preferences> QuerySession<T, S, P> {
    /// Creates a disconnected session, restoring the saved view from
    /// `preferences`.
    ///
    /// The stored page index is not resumed: pagination always starts at the
    /// first page once the connection opens.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences backend cannot be read.
    pub fn new(options: SessionOptions, timers: S, preferences: P) -> Result<Self> {
        let saved = preferences.load_view(options.page_size)?;

        let mut state = SessionState::new(saved.page_size, options.debounce);
        state.legacy_correlation = options.legacy_correlation;
        state.filters = saved.filters;
        state.unit_system = saved.unit_system;
        state.sort = saved.sort.filter(|s| {
            let known = is_known_field(&s.field);
            if !known {
                tracing::warn!(field = %s.field, "dropping stored sort on unknown field");
            }
            known
        });
        tracing::info!(
            page_size = state.page_size,
            filters = state.filters.len(),
            sort = ?state.sort,
            stored_page = saved.page,
            "session restored"
        );

        let (tx, inbox) = mpsc::unbounded_channel();
        let mut channel = ChannelAdapter::new();
        channel.on_message(move |message| {
            if tx.send(message).is_err() {
                tracing::warn!("session inbox closed, dropping reply");
            }
        });

        let view = ViewStore::new(state.view_state());
        Ok(Self {
            state,
            channel,
            inbox,
            view,
            timers,
            preferences,
        })
    }

    /// Attaches a transport that is connecting to `address`.
    ///
    /// Replacing a live or connecting transport counts as losing the
    /// connection: the outstanding request is dropped and the view goes
    /// offline until the new transport opens.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::FlightdeckError::SessionClosed`] after teardown.
    pub fn connect(&mut self, address: &str, transport: T) -> Result<()> {
        if self.state.phase.is_closed() {
            return Err(FlightdeckError::SessionClosed);
        }
        let replacing = matches!(
            self.channel.state(),
            ConnectionState::Open | ConnectionState::Connecting
        );
        self.channel.connect(address, transport);
        if replacing {
            self.dispatch(&Event::ConnectionLost)?;
        }
        Ok(())
    }

    /// Feeds a transport lifecycle event or inbound frame through the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::FlightdeckError::SessionClosed`] after teardown
    /// when the event would have reached the coordinator.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Result<()> {
        match self.channel.handle_transport_event(event) {
            ChannelSignal::Connected => self.dispatch(&Event::ConnectionOpened),
            ChannelSignal::Disconnected => self.dispatch(&Event::ConnectionLost),
            ChannelSignal::Delivered => self.drain_inbox(),
            ChannelSignal::Dropped | ChannelSignal::Ignored => Ok(()),
        }
    }

    fn drain_inbox(&mut self) -> Result<()> {
        while let Ok(message) = self.inbox.try_recv() {
            self.dispatch(&Event::ResponseReceived(message))?;
        }
        Ok(())
    }

    /// Partial filter edit; `None` values remove a key. Debounced.
    ///
    /// # Errors
    ///
    /// Fails only after teardown.
    pub fn on_filter_changed(&mut self, patch: FilterPatch) -> Result<()> {
        self.dispatch(&Event::FilterEdited(patch))
    }

    /// Sorts by `field` in `order`, restarting at the first page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::FlightdeckError::InvalidInput`] for a field
    /// outside the catalogue.
    pub fn on_sort_changed(&mut self, field: &str, order: SortOrder) -> Result<()> {
        self.dispatch(&Event::SortChanged(Some(SortModel {
            field: field.to_string(),
            order,
        })))
    }

    /// Clears sorting, restarting at the first page.
    ///
    /// # Errors
    ///
    /// Fails only after teardown.
    pub fn on_sort_cleared(&mut self) -> Result<()> {
        self.dispatch(&Event::SortChanged(None))
    }

    /// Navigates to a zero-based page.
    ///
    /// # Errors
    ///
    /// Fails only after teardown.
    pub fn on_page_changed(&mut self, page: usize) -> Result<()> {
        self.dispatch(&Event::PageChanged(page))
    }

    /// # Errors
    ///
    /// Returns [`crate::domain::FlightdeckError::InvalidInput`] for zero.
    pub fn on_page_size_changed(&mut self, size: usize) -> Result<()> {
        self.dispatch(&Event::PageSizeChanged(size))
    }

    /// # Errors
    ///
    /// Fails only after teardown.
    pub fn on_unit_system_changed(&mut self, units: UnitSystem) -> Result<()> {
        self.dispatch(&Event::UnitSystemChanged(units))
    }

    /// Debounce timer for `generation` elapsed.
    ///
    /// # Errors
    ///
    /// Fails only after teardown.
    pub fn handle_timer(&mut self, generation: u64) -> Result<()> {
        self.dispatch(&Event::FiltersSettled { generation })
    }

    /// Live-refresh tick.
    ///
    /// # Errors
    ///
    /// Fails only after teardown.
    pub fn on_refresh_tick(&mut self) -> Result<()> {
        self.dispatch(&Event::RefreshTick)
    }

    /// Cancels timers, closes the connection and discards unsent frames.
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other inputs.
    pub fn teardown(&mut self) -> Result<()> {
        self.dispatch(&Event::Teardown)
    }

    #[must_use]
    pub const fn view(&self) -> &ViewStore {
        &self.view
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn channel(&self) -> &ChannelAdapter<T> {
        &self.channel
    }

    #[must_use]
    pub const fn preferences(&self) -> &P {
        &self.preferences
    }

    #[must_use]
    pub const fn timers(&self) -> &S {
        &self.timers
    }

    fn dispatch(&mut self, event: &Event) -> Result<()> {
        let (changed, actions) = handle_event(&mut self.state, event)?;
        for action in actions {
            self.execute(action);
        }
        if changed {
            self.view.publish(self.state.view_state());
        }
        Ok(())
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::Send(message) => {
                if let Err(e) = self.channel.send(&message) {
                    tracing::warn!(error = %e, request_id = %message.request_id, "query not sent");
                    self.state.connection_lost();
                }
            }
            Action::ScheduleDebounce { generation, delay } => {
                self.timers.schedule(generation, delay);
            }
            Action::CancelTimers => self.timers.cancel_all(),
            Action::SavePreference(update) => {
                if let Err(e) = self.persist(&update) {
                    tracing::warn!(error = %e, update = ?update, "failed to save preference");
                }
            }
            Action::CloseChannel => self.channel.teardown(),
        }
    }

    fn persist(&mut self, update: &PreferenceUpdate) -> Result<()> {
        let prefs = &mut self.preferences;
        match update {
            PreferenceUpdate::Page(page) => prefs.set(PreferenceKey::Page, page),
            PreferenceUpdate::PageSize(size) => prefs.set(PreferenceKey::PageSize, size),
            PreferenceUpdate::Sort(sort) => prefs.set(PreferenceKey::SortModel, sort),
            PreferenceUpdate::Filters(filters) => prefs.set(PreferenceKey::Filters, filters),
            PreferenceUpdate::UnitSystem(units) => prefs.set(PreferenceKey::UnitSystem, units),
        }
    }
}

impl<T: Transport, S: TimerScheduler, P: Preferences> Drop for QuerySession<T, S, P> {
    fn drop(&mut self) {
        if !self.state.phase.is_closed() {
            tracing::debug!("session dropped without teardown");
            if let Err(e) = self.teardown() {
                tracing::warn!(error = %e, "teardown on drop failed");
            }
        }
    }
}
