//! Coordinator phase type.
//!
//! The coordinator is either waiting for the answer to exactly one request or
//! it is not. Which request counts as "the" request is carried in the phase
//! itself, so there is no separate pending-token field to fall out of sync.
//!
//! ```text
//!            send (filters / sort / page / size / connect / refresh)
//!   Idle ─────────────────────────────────────────────▶ AwaitingResponse(t)
//!    ▲                                                        │
//!    └──────── reply tagged t, or connection lost ◀──────────┘
//!
//!   any ── teardown ──▶ Closed
//! ```

use crate::channel::RequestToken;

/// Current phase of the query coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No request outstanding.
    Idle,

    /// One request outstanding; only a reply tagged with this token may
    /// change the visible rows. Sending another request replaces the token.
    AwaitingResponse(RequestToken),

    /// The session was torn down and ignores further events.
    Closed,
}

impl SessionPhase {
    /// Token of the outstanding request, if any.
    #[must_use]
    pub const fn pending_token(self) -> Option<RequestToken> {
        match self {
            Self::AwaitingResponse(token) => Some(token),
            Self::Idle | Self::Closed => None,
        }
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}
