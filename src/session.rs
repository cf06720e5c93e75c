//! Shared authentication session state.

use std::sync::atomic::{AtomicBool, Ordering};

/// Login state shared between the consumer and the middleware chain.
///
/// The auth middleware flips `unauthenticated_occurred` when the server
/// rejects a call with UNAUTHENTICATED; the consumer watches that flag to
/// force a re-login. Setting it is idempotent: repeated rejections while
/// a prompt is already showing change nothing.
#[derive(Debug, Default)]
pub struct SessionState {
    unauthenticated_occurred: AtomicBool,
    logged_in: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the session was rejected by the server.
    pub fn mark_unauthenticated(&self) {
        self.unauthenticated_occurred.store(true, Ordering::Relaxed);
    }

    pub fn unauthenticated_occurred(&self) -> bool {
        self.unauthenticated_occurred.load(Ordering::Relaxed)
    }

    /// Record a completed login or logout. Logging in clears the
    /// rejection flag.
    pub fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::Relaxed);
        if logged_in {
            self.unauthenticated_occurred.store(false, Ordering::Relaxed);
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Relaxed)
    }
}
