//! Cursor ledger: page index to pagination token.
//!
//! The service pages by cursor, not by offset, so the only way to reach page
//! `n` is with the token the service handed back while answering page `n - 1`.
//! The ledger records those tokens as responses arrive. Page 0 always maps to
//! "no cursor".
//!
//! Invariant: the ledger holds an entry for page `k + 1` only if it holds page
//! `k` and a response for page `k` has been processed. Entries are therefore
//! always a contiguous run `0..=frontier`.

use crate::domain::Cursor;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorLedger {
    entries: BTreeMap<usize, Option<Cursor>>,
}

impl Default for CursorLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorLedger {
    /// Creates a ledger holding only `{0: null}`.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(0, None);
        Self { entries }
    }

    /// Drops every entry except `{0: null}`.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries.insert(0, None);
    }

    /// Token for `page`: `Some(None)` for page 0, `Some(Some(..))` for a page
    /// already reached, `None` when the page lies beyond the frontier.
    #[must_use]
    pub fn get(&self, page: usize) -> Option<Option<&Cursor>> {
        self.entries.get(&page).map(Option::as_ref)
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.entries.contains_key(&page)
    }

    /// Highest page index with a known token.
    #[must_use]
    pub fn frontier(&self) -> usize {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Page whose token is `cursor`, if the ledger holds it.
    #[must_use]
    pub fn page_of(&self, cursor: &Cursor) -> Option<usize> {
        self.entries
            .iter()
            .find(|(_, c)| c.as_ref() == Some(cursor))
            .map(|(page, _)| *page)
    }

    /// Records the token for the page after `page`, once `page` has been
    /// answered.
    ///
    /// Ignored if `page` itself is unknown, which keeps the ledger contiguous.
    /// If the new token differs from the one already held for `page + 1`, every
    /// entry past it is dropped: those tokens were derived from rows that have
    /// since moved.
    ///
    /// Returns `true` if the ledger changed.
    pub fn record_next(&mut self, page: usize, next: Cursor) -> bool {
        if !self.entries.contains_key(&page) {
            tracing::warn!(page, "ignoring cursor for a page outside the ledger");
            return false;
        }

        let slot = page + 1;
        let previous = self.entries.insert(slot, Some(next.clone()));
        match previous {
            Some(Some(ref old)) if *old == next => false,
            Some(_) => {
                let stale = self.entries.split_off(&(slot + 1));
                tracing::debug!(
                    page = slot,
                    dropped = stale.len(),
                    "cursor changed, truncating ledger"
                );
                true
            }
            None => true,
        }
    }

    /// Drops every entry past `page` (used when the service reports no more
    /// pages after it).
    pub fn truncate_after(&mut self, page: usize) {
        let _ = self.entries.split_off(&(page + 1));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all entries, in page order.
    #[must_use]
    pub fn entries(&self) -> Vec<(usize, Option<Cursor>)> {
        self.entries.iter().map(|(p, c)| (*p, c.clone())).collect()
    }
}
