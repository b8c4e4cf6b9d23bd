//! Quiet-interval debouncer for filter input.
//!
//! The debouncer is a pure state machine; it never sleeps. Each
//! [`Debouncer::push`] returns a [`DebounceTicket`] naming a generation and a
//! deadline, and the runtime arranges for [`Debouncer::fire`] to be called with
//! that generation once the deadline passes. Only the newest generation emits,
//! so a burst of edits collapses into a single settled value.
//!
//! ```text
//! push(a) @0ms   -> ticket g1, deadline 300ms
//! push(b) @50ms  -> ticket g2, deadline 350ms   (g1 now stale)
//! fire(g1)       -> None
//! fire(g2)       -> Some(b)
//! ```

use std::time::{Duration, Instant};

/// A scheduled emission: fire `generation` at `deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    pub generation: u64,
    pub deadline: Instant,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    generation: u64,
    pending: Option<(u64, T)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            pending: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Records a new input, superseding any pending one.
    pub fn push(&mut self, value: T, now: Instant) -> DebounceTicket {
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some((self.generation, value));
        DebounceTicket {
            generation: self.generation,
            deadline: now + self.interval,
            delay: self.interval,
        }
    }

    /// Emits the pending value if `generation` is still the newest input.
    pub fn fire(&mut self, generation: u64) -> Option<T> {
        match self.pending.take() {
            Some((pending_gen, value)) if pending_gen == generation => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// The value waiting to settle, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, v)| v)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending value; outstanding tickets will never emit.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!(generation = self.generation, "debounce cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
    }
}
