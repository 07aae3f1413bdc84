//! Identity of the thread that owns the front end.

use std::thread::{self, ThreadId};

/// Identity of the thread that constructed the top-level controller.
///
/// Captured once at construction and never updated. Worker threads compare
/// against it to decide whether a blocking front-end query is legal to
/// issue synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainThreadIdentity(ThreadId);

impl MainThreadIdentity {
    /// Capture the identity of the calling thread.
    pub fn capture() -> Self {
        Self(thread::current().id())
    }

    /// True when the calling thread is the captured one.
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.0
    }

    /// The captured thread id.
    pub fn id(&self) -> ThreadId {
        self.0
    }
}
