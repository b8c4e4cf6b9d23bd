//! View state store: the one surface the display layer reads.
//!
//! Each publish replaces the whole [`ViewState`] behind a fresh `Arc`, so an
//! observer holding a snapshot never sees a half-applied update. Subscribers
//! use a `tokio::sync::watch` receiver and always observe the latest value.

use crate::domain::{Row, UnitSystem};
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of everything a table widget needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Rows of the currently displayed page, in service order.
    pub rows: Vec<Row>,

    /// Total rows matching the active filters across all pages.
    pub total_count: u64,

    /// A request is outstanding.
    pub is_loading: bool,

    /// Last server-reported query error; cleared by the next good page.
    pub error_message: Option<String>,

    /// Zero-based index of the displayed page.
    pub page_index: usize,

    pub page_size: usize,

    /// The service reported a page after this one.
    pub has_more: bool,

    pub is_connected: bool,

    pub unit_system: UnitSystem,
}

impl ViewState {
    /// Number of pages implied by `total_count` and `page_size`.
    #[must_use]
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        let total = usize::try_from(self.total_count).unwrap_or(usize::MAX);
        total.div_ceil(self.page_size)
    }
}

/// Observable holder for the latest [`ViewState`].
#[derive(Debug)]
pub struct ViewStore {
    sender: watch::Sender<Arc<ViewState>>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl ViewStore {
    #[must_use]
    pub fn new(initial: ViewState) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self { sender }
    }

    /// Replaces the current state wholesale and wakes every subscriber.
    ///
    /// Publishing a value equal to the current one is a no-op.
    pub fn publish(&self, state: ViewState) {
        let changed = self.sender.send_if_modified(|current| {
            if **current == state {
                false
            } else {
                *current = Arc::new(state);
                true
            }
        });
        if changed {
            tracing::trace!(subscribers = self.sender.receiver_count(), "view state published");
        }
    }

    /// The latest state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ViewState> {
        Arc::clone(&self.sender.borrow())
    }

    /// Subscribes to future updates; the receiver starts at the latest state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.sender.subscribe()
    }
}
