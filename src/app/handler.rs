//! Event handling and state transition logic for the query coordinator.
//!
//! [`handle_event`] is the whole coordinator: it takes one [`Event`], mutates
//! [`SessionState`], and returns whether the view changed together with the
//! [`Action`]s the owning session must execute. It never performs I/O, so every
//! transition can be exercised with plain values.
//!
//! # Event Types
//!
//! - **User intent**: `FilterEdited`, `FiltersSettled`, `SortChanged`,
//!   `PageChanged`, `PageSizeChanged`, `UnitSystemChanged`
//! - **Connection**: `ConnectionOpened`, `ConnectionLost`, `ResponseReceived`
//! - **Timers**: `RefreshTick`
//! - **Lifecycle**: `Teardown`
//!
//! # Example
//!
//! ```rust
//! use flightdeck::app::{handle_event, Action, Event, SessionState};
//! use std::time::Duration;
//!
//! let mut state = SessionState::new(50, Duration::from_millis(300));
//! let (changed, actions) = handle_event(&mut state, &Event::ConnectionOpened)?;
//! assert!(changed);
//! assert!(matches!(actions[0], Action::Send(_)));
//! # Ok::<(), flightdeck::domain::FlightdeckError>(())
//! ```

use super::actions::{Action, PreferenceUpdate};
use super::modes::SessionPhase;
use super::state::{Correlation, SessionState};
use crate::channel::ServerMessage;
use crate::domain::fields::is_known_field;
use crate::domain::{FilterPatch, FlightdeckError, Result, SortModel, UnitSystem};
use std::time::Instant;

/// Discrete inputs to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A partial filter edit from the display layer. Debounced.
    FilterEdited(FilterPatch),

    /// The debounce timer for `generation` elapsed.
    FiltersSettled { generation: u64 },

    /// New sort model, or `None` to clear sorting. Applied immediately.
    SortChanged(Option<SortModel>),

    /// Navigate to a zero-based page.
    PageChanged(usize),

    PageSizeChanged(usize),

    UnitSystemChanged(UnitSystem),

    /// The channel opened (first connect or reconnect).
    ConnectionOpened,

    /// The channel closed or failed.
    ConnectionLost,

    /// A decoded reply from the service.
    ResponseReceived(ServerMessage),

    /// Live-refresh timer tick.
    RefreshTick,

    Teardown,
}

/// Processes an event, mutates session state, and returns actions to execute.
///
/// The returned flag is `true` when the view state changed and should be
/// republished.
///
/// # Errors
///
/// Returns [`FlightdeckError::InvalidInput`] for an unknown sort field or a
/// zero page size, and [`FlightdeckError::SessionClosed`] for any event other
/// than `Teardown` after the session was torn down. State is untouched in
/// both cases.
pub fn handle_event(state: &mut SessionState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event = event_name(event)).entered();

    if state.phase.is_closed() {
        if matches!(event, Event::Teardown) {
            return Ok((false, vec![]));
        }
        return Err(FlightdeckError::SessionClosed);
    }

    match event {
        Event::FilterEdited(patch) => {
            let ticket = state.stage_filters(patch, Instant::now());
            tracing::debug!(generation = ticket.generation, keys = patch.len(), "filter edit staged");
            Ok((
                false,
                vec![Action::ScheduleDebounce {
                    generation: ticket.generation,
                    delay: ticket.delay,
                }],
            ))
        }

        Event::FiltersSettled { generation } => {
            let Some(filters) = state.settle_filters(*generation) else {
                tracing::trace!(generation, "stale debounce timer");
                return Ok((false, vec![]));
            };

            // Equal filters still restart pagination.
            state.filters = filters;
            let message = state.restart();
            Ok((
                true,
                vec![
                    Action::Send(message),
                    Action::SavePreference(PreferenceUpdate::Filters(state.filters.clone())),
                    Action::SavePreference(PreferenceUpdate::Page(0)),
                ],
            ))
        }

        Event::SortChanged(sort) => {
            if let Some(model) = sort {
                if !is_known_field(&model.field) {
                    return Err(FlightdeckError::InvalidInput(format!(
                        "unknown sort field '{}'",
                        model.field
                    )));
                }
            }

            state.sort.clone_from(sort);
            let message = state.restart();
            Ok((
                true,
                vec![
                    Action::Send(message),
                    Action::SavePreference(PreferenceUpdate::Sort(sort.clone())),
                    Action::SavePreference(PreferenceUpdate::Page(0)),
                ],
            ))
        }

        Event::PageChanged(requested) => {
            let (page, cursor) = state.resolve_page(*requested);
            if page != *requested {
                tracing::debug!(requested, page, "page beyond known frontier");
            }
            let message = state.begin_query(page, cursor);
            Ok((
                true,
                vec![
                    Action::Send(message),
                    Action::SavePreference(PreferenceUpdate::Page(page)),
                ],
            ))
        }

        Event::PageSizeChanged(size) => {
            if *size == 0 {
                return Err(FlightdeckError::InvalidInput(
                    "page size must be positive".to_string(),
                ));
            }

            state.page_size = *size;
            let message = state.restart();
            Ok((
                true,
                vec![
                    Action::Send(message),
                    Action::SavePreference(PreferenceUpdate::PageSize(*size)),
                    Action::SavePreference(PreferenceUpdate::Page(0)),
                ],
            ))
        }

        Event::UnitSystemChanged(units) => {
            let changed = state.unit_system != *units;
            state.unit_system = *units;
            Ok((
                changed,
                vec![Action::SavePreference(PreferenceUpdate::UnitSystem(*units))],
            ))
        }

        Event::ConnectionOpened => {
            tracing::info!(previous_page = state.page_index, "connection established, restarting at first page");
            state.connected = true;
            let message = state.restart();
            Ok((true, vec![Action::Send(message)]))
        }

        Event::ConnectionLost => {
            if let SessionPhase::AwaitingResponse(token) = state.phase {
                tracing::warn!(token = %token, "connection lost with a request outstanding");
            }
            state.connection_lost();
            Ok((true, vec![]))
        }

        Event::ResponseReceived(message) => match state.correlate(message) {
            Correlation::Current => {
                state.apply_response(message);
                Ok((true, vec![]))
            }
            Correlation::Stale => {
                tracing::debug!(
                    token = ?message.request_id,
                    pending = ?state.phase.pending_token(),
                    "discarding stale reply"
                );
                Ok((false, vec![]))
            }
            Correlation::Uncorrelated => {
                tracing::warn!("discarding reply without request_id");
                Ok((false, vec![]))
            }
        },

        Event::RefreshTick => {
            if !state.connected || state.phase != SessionPhase::Idle {
                tracing::trace!(connected = state.connected, phase = ?state.phase, "refresh skipped");
                return Ok((false, vec![]));
            }
            let (page, cursor) = state.resolve_page(state.page_index);
            let message = state.begin_query(page, cursor);
            Ok((true, vec![Action::Send(message)]))
        }

        Event::Teardown => {
            tracing::info!("tearing down session");
            state.close();
            Ok((true, vec![Action::CancelTimers, Action::CloseChannel]))
        }
    }
}

const fn event_name(event: &Event) -> &'static str {
    match event {
        Event::FilterEdited(_) => "filter_edited",
        Event::FiltersSettled { .. } => "filters_settled",
        Event::SortChanged(_) => "sort_changed",
        Event::PageChanged(_) => "page_changed",
        Event::PageSizeChanged(_) => "page_size_changed",
        Event::UnitSystemChanged(_) => "unit_system_changed",
        Event::ConnectionOpened => "connection_opened",
        Event::ConnectionLost => "connection_lost",
        Event::ResponseReceived(_) => "response_received",
        Event::RefreshTick => "refresh_tick",
        Event::Teardown => "teardown",
    }
}
