//! Playback intent sessions
//!
//! Backend command completions arrive in any order relative to issuance,
//! and the user can issue a new intent while a prior chain is still
//! suspended on the backend. The session token is the only serialization
//! mechanism: every multi-step asynchronous operation captures a token up
//! front and re-checks it after each suspension point before committing
//! state changes or chaining further backend calls. A continuation whose
//! token is no longer current abandons its effects silently.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque token identifying one playback intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

/// Monotonic intent counter
///
/// Bumping the counter is the cancellation primitive for in-flight
/// load/seek chains; the superseded chain notices at its next checkpoint.
#[derive(Debug, Default)]
pub struct SessionManager {
    counter: AtomicU64,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new intent, invalidating every previously issued token
    pub fn begin(&self) -> SessionToken {
        SessionToken(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The token representing the live intent
    pub fn current(&self) -> SessionToken {
        SessionToken(self.counter.load(Ordering::SeqCst))
    }

    /// Whether the given token still identifies the live intent
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.counter.load(Ordering::SeqCst) == token.0
    }
}
