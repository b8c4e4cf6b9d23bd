//! Query session state.
//!
//! [`SessionState`] is the single owner of everything the coordinator knows:
//! the user's intent (filters, sort, page, page size), the pagination ledger,
//! the token of the outstanding request, and the last materialized page. The
//! handler in [`crate::app::handler`] is the only code that mutates it.
//!
//! # Correlation
//!
//! Every request gets a fresh [`RequestToken`]. Sending a request moves the
//! phase to [`SessionPhase::AwaitingResponse`] with that token, which silently
//! invalidates any earlier request still in flight. Only a reply carrying the
//! current token may touch `rows` and `total_count`.
//!
//! # Example
//!
//! ```rust
//! use flightdeck::app::SessionState;
//! use std::time::Duration;
//!
//! let mut state = SessionState::new(50, Duration::from_millis(300));
//! let message = state.restart();
//! assert_eq!(message.query.cursor, None);
//! assert!(state.is_loading);
//! ```

use super::debounce::{DebounceTicket, Debouncer};
use super::ledger::CursorLedger;
use super::modes::SessionPhase;
use super::view::ViewState;
use crate::channel::{ClientMessage, RequestToken, ServerMessage};
use crate::domain::{Cursor, FilterPatch, Filters, QueryRequest, Row, SortModel, UnitSystem};
use std::time::{Duration, Instant};

/// Outcome of matching a reply against the outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// The reply answers the outstanding request.
    Current,
    /// The reply answers a superseded request, or nothing is outstanding.
    Stale,
    /// The reply has no token and cannot be matched.
    Uncorrelated,
}

/// Coordinator state for one query session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Settled filter predicates the current request was built from.
    pub filters: Filters,

    pub sort: Option<SortModel>,

    /// Page the displayed rows belong to. Moves only when a reply is applied.
    pub page_index: usize,

    pub page_size: usize,

    /// Cursor of the next unseen page, from the last applied reply.
    pub last_cursor_sent: Option<Cursor>,

    pub phase: SessionPhase,

    pub rows: Vec<Row>,

    pub total_count: u64,

    pub is_loading: bool,

    /// Last server-reported query error.
    pub error_message: Option<String>,

    /// Whether the last applied reply named a following page.
    pub has_more: bool,

    pub connected: bool,

    pub unit_system: UnitSystem,

    /// Accept replies without `request_id` when their echoed page size
    /// matches the outstanding request.
    pub legacy_correlation: bool,

    ledger: CursorLedger,
    debouncer: Debouncer<Filters>,
    last_token: RequestToken,
    pending_request: Option<QueryRequest>,
    pending_page: Option<usize>,
}

impl SessionState {
    /// Creates an idle, disconnected state on page 0 with no filters.
    #[must_use]
    pub fn new(page_size: usize, debounce: Duration) -> Self {
        Self {
            filters: Filters::new(),
            sort: None,
            page_index: 0,
            page_size,
            last_cursor_sent: None,
            phase: SessionPhase::Idle,
            rows: Vec::new(),
            total_count: 0,
            is_loading: false,
            error_message: None,
            has_more: true,
            connected: false,
            unit_system: UnitSystem::default(),
            legacy_correlation: false,
            ledger: CursorLedger::new(),
            debouncer: Debouncer::new(debounce),
            last_token: RequestToken(0),
            pending_request: None,
            pending_page: None,
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &CursorLedger {
        &self.ledger
    }

    /// Token of the most recently sent request.
    #[must_use]
    pub const fn last_token(&self) -> RequestToken {
        self.last_token
    }

    /// The request the coordinator is waiting on, if any.
    #[must_use]
    pub const fn pending_request(&self) -> Option<&QueryRequest> {
        self.pending_request.as_ref()
    }

    /// Page the outstanding request will land on.
    #[must_use]
    pub const fn pending_page(&self) -> Option<usize> {
        self.pending_page
    }

    /// Filters as the user currently sees them: the unsettled edit if one is
    /// pending, else the active set.
    #[must_use]
    pub fn effective_filters(&self) -> &Filters {
        self.debouncer.pending().unwrap_or(&self.filters)
    }

    /// Merges `patch` into the effective filters and restarts the quiet interval.
    pub fn stage_filters(&mut self, patch: &FilterPatch, now: Instant) -> DebounceTicket {
        let next = self.effective_filters().patched(patch);
        self.debouncer.push(next, now)
    }

    /// Takes the staged filters if `generation` is still the newest edit.
    pub fn settle_filters(&mut self, generation: u64) -> Option<Filters> {
        self.debouncer.fire(generation)
    }

    /// Drops any staged filter edit.
    pub fn cancel_staged(&mut self) {
        self.debouncer.cancel();
    }

    /// Builds and registers the request for `page`, superseding any
    /// outstanding one.
    pub fn begin_query(&mut self, page: usize, cursor: Option<Cursor>) -> ClientMessage {
        let token = self.last_token.next();
        self.last_token = token;

        let request = QueryRequest::new(self.filters.clone(), self.sort.as_ref(), self.page_size, cursor);
        if let SessionPhase::AwaitingResponse(previous) = self.phase {
            tracing::debug!(superseded = %previous, token = %token, "superseding outstanding request");
        }

        self.pending_page = Some(page);
        self.phase = SessionPhase::AwaitingResponse(token);
        self.is_loading = true;
        self.pending_request = Some(request.clone());

        tracing::debug!(token = %token, page, cursor = ?request.cursor, "query issued");
        ClientMessage::query(token, request)
    }

    /// Resets pagination to the first page and issues its request.
    pub fn restart(&mut self) -> ClientMessage {
        self.ledger.reset();
        self.last_cursor_sent = None;
        self.has_more = true;
        self.begin_query(0, None)
    }

    /// Picks the page and cursor to request for navigation to `requested`.
    ///
    /// A page the ledger knows is requested with its own cursor. Anything past
    /// the frontier falls back to the page owning `last_cursor_sent` (the next
    /// unseen page), and to the frontier itself when that is unknown.
    #[must_use]
    pub fn resolve_page(&self, requested: usize) -> (usize, Option<Cursor>) {
        if let Some(cursor) = self.ledger.get(requested) {
            return (requested, cursor.cloned());
        }
        if let Some(page) = self
            .last_cursor_sent
            .as_ref()
            .and_then(|last| self.ledger.page_of(last))
        {
            return (page, self.last_cursor_sent.clone());
        }
        let frontier = self.ledger.frontier();
        (frontier, self.ledger.get(frontier).flatten().cloned())
    }

    /// Matches a reply against the outstanding request.
    #[must_use]
    pub fn correlate(&self, message: &ServerMessage) -> Correlation {
        let Some(pending) = self.phase.pending_token() else {
            return Correlation::Stale;
        };

        match message.request_id {
            Some(token) if token == pending => Correlation::Current,
            Some(_) => Correlation::Stale,
            None if self.legacy_correlation => {
                let echoed = message.response.page_size;
                let expected = self.pending_request.as_ref().map(|r| r.page_size);
                if echoed.is_some() && echoed == expected {
                    Correlation::Current
                } else {
                    Correlation::Stale
                }
            }
            None => Correlation::Uncorrelated,
        }
    }

    /// Applies a correlated reply.
    pub fn apply_response(&mut self, message: &ServerMessage) {
        let response = &message.response;
        self.is_loading = false;
        self.phase = SessionPhase::Idle;
        self.pending_request = None;
        let page = self.pending_page.take().unwrap_or(self.page_index);

        if let Some(error) = &response.error {
            tracing::error!(error = %error, page, shown = self.page_index, "query failed");
            self.error_message = Some(error.clone());
            return;
        }

        self.page_index = page;
        self.rows.clone_from(&response.results);
        self.total_count = response.results_count.unwrap_or_default();
        self.error_message = None;

        match &response.next_cursor {
            Some(next) => {
                self.ledger.record_next(self.page_index, next.clone());
                self.last_cursor_sent = Some(next.clone());
                self.has_more = true;
            }
            None => {
                self.ledger.truncate_after(self.page_index);
                self.has_more = false;
            }
        }

        tracing::debug!(
            page = self.page_index,
            rows = self.rows.len(),
            total = self.total_count,
            frontier = self.ledger.frontier(),
            "page applied"
        );
    }

    /// Forgets the outstanding request after the connection dropped.
    pub fn connection_lost(&mut self) {
        self.connected = false;
        self.is_loading = false;
        self.pending_request = None;
        self.pending_page = None;
        if !self.phase.is_closed() {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Marks the session closed and drops staged input.
    pub fn close(&mut self) {
        self.debouncer.cancel();
        self.is_loading = false;
        self.pending_request = None;
        self.pending_page = None;
        self.phase = SessionPhase::Closed;
    }

    /// Snapshot for the view store.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        ViewState {
            rows: self.rows.clone(),
            total_count: self.total_count,
            is_loading: self.is_loading,
            error_message: self.error_message.clone(),
            page_index: self.page_index,
            page_size: self.page_size,
            has_more: self.has_more,
            is_connected: self.connected,
            unit_system: self.unit_system,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterValue, QueryResponse};

    fn state() -> SessionState {
        SessionState::new(50, Duration::from_millis(300))
    }

    fn page(token: RequestToken, next: Option<&str>) -> ServerMessage {
        ServerMessage::reply(token, QueryResponse::page(vec![Row::new()], 120, next.map(Cursor::from)))
    }

    #[test]
    fn tokens_increase_per_request() {
        let mut state = state();
        let a = state.restart();
        let b = state.begin_query(0, None);
        assert!(b.request_id > a.request_id);
        assert_eq!(state.phase, SessionPhase::AwaitingResponse(b.request_id));
    }

    #[test]
    fn only_latest_token_correlates() {
        let mut state = state();
        let a = state.restart();
        let b = state.restart();

        assert_eq!(state.correlate(&page(a.request_id, None)), Correlation::Stale);
        assert_eq!(state.correlate(&page(b.request_id, None)), Correlation::Current);
    }

    #[test]
    fn untokened_reply_needs_legacy_mode() {
        let mut state = state();
        state.restart();
        let mut reply = ServerMessage {
            request_id: None,
            response: QueryResponse::page(vec![], 0, None),
        };
        reply.response.page_size = Some(50);
        assert_eq!(state.correlate(&reply), Correlation::Uncorrelated);

        state.legacy_correlation = true;
        assert_eq!(state.correlate(&reply), Correlation::Current);

        reply.response.page_size = Some(25);
        assert_eq!(state.correlate(&reply), Correlation::Stale);
    }

    #[test]
    fn applied_reply_extends_ledger() {
        let mut state = state();
        let first = state.restart();
        state.apply_response(&page(first.request_id, Some("c1")));

        assert_eq!(state.ledger().get(1), Some(Some(&Cursor::from("c1"))));
        assert_eq!(state.last_cursor_sent, Some(Cursor::from("c1")));
        assert_eq!(state.total_count, 120);
        assert!(!state.is_loading);
        assert_eq!(state.phase, SessionPhase::Idle);
    }

    #[test]
    fn final_page_keeps_last_cursor_and_clears_has_more() {
        let mut state = state();
        let first = state.restart();
        state.apply_response(&page(first.request_id, Some("c1")));
        let second = state.begin_query(1, Some("c1".into()));
        state.apply_response(&page(second.request_id, None));

        assert!(!state.has_more);
        assert_eq!(state.last_cursor_sent, Some(Cursor::from("c1")));
        assert_eq!(state.ledger().frontier(), 1);
        // Navigating past the end re-requests the last page.
        assert_eq!(state.resolve_page(5), (1, Some("c1".into())));
    }

    #[test]
    fn error_reply_keeps_rows() {
        let mut state = state();
        let first = state.restart();
        state.apply_response(&page(first.request_id, Some("c1")));
        let second = state.begin_query(1, Some("c1".into()));
        state.apply_response(&ServerMessage::reply(second.request_id, QueryResponse::failure("boom")));

        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.total_count, 120);
        assert_eq!(state.error_message.as_deref(), Some("boom"));
        assert!(!state.is_loading);
        assert_eq!(state.ledger().frontier(), 1);
        assert_eq!(state.page_index, 0);
        assert_eq!(state.pending_page(), None);
    }

    #[test]
    fn page_index_follows_applied_replies_only() {
        let mut state = state();
        let first = state.restart();
        state.apply_response(&page(first.request_id, Some("c1")));

        state.begin_query(1, Some("c1".into()));
        assert_eq!(state.page_index, 0);
        assert_eq!(state.pending_page(), Some(1));

        state.connection_lost();
        assert_eq!(state.page_index, 0);
        assert_eq!(state.pending_page(), None);
        assert_eq!(state.resolve_page(state.page_index), (0, None));
    }

    #[test]
    fn staged_edits_merge_before_settling() {
        let mut state = state();
        let now = Instant::now();
        let mut patch = FilterPatch::new();
        patch.insert("callsign".into(), Some(FilterValue::Text("DLH".into())));
        state.stage_filters(&patch, now);

        let mut patch = FilterPatch::new();
        patch.insert("on_ground".into(), Some(FilterValue::Bool(false)));
        let ticket = state.stage_filters(&patch, now);

        assert!(state.filters.is_empty());
        assert_eq!(state.effective_filters().len(), 2);
        let settled = state.settle_filters(ticket.generation).unwrap();
        assert_eq!(settled.len(), 2);
    }

    #[test]
    fn resolve_page_without_any_reply_starts_over() {
        let state = state();
        assert_eq!(state.resolve_page(3), (0, None));
    }
}
