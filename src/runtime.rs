//! Tokio-backed timer driver.
//!
//! Each scheduled debounce becomes a small task that sleeps and then posts
//! its generation on a channel. The tasks never touch session state; the
//! event loop reads the channel and calls
//! [`crate::session::QuerySession::handle_timer`].

use crate::session::TimerScheduler;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct TokioTimers {
    fired: mpsc::UnboundedSender<u64>,
    pending: Vec<JoinHandle<()>>,
}

impl TokioTimers {
    /// Creates the driver and the receiver on which elapsed generations arrive.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (fired, rx) = mpsc::unbounded_channel();
        (
            Self {
                fired,
                pending: Vec::new(),
            },
            rx,
        )
    }

    /// Timers that have not fired or been cancelled yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|t| !t.is_finished()).count()
    }
}

impl TimerScheduler for TokioTimers {
    fn schedule(&mut self, generation: u64, delay: Duration) {
        self.pending.retain(|t| !t.is_finished());

        let fired = self.fired.clone();
        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if fired.send(generation).is_err() {
                tracing::trace!(generation, "timer fired after receiver closed");
            }
        }));
    }

    fn cancel_all(&mut self) {
        for task in self.pending.drain(..) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
