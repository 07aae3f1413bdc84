//! Progress indicator capability and the built-in implementations.
//!
//! An indicator is a bounded progress sequence: a fixed number of states,
//! a title, and a message for the current state. The control layer only
//! drives indicators; rendering belongs to whichever front end created
//! them through the factory.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared handle to a progress indicator.
///
/// Shared between the registry entry and any stage currently driving the
/// indicator; the indicator lives as long as the longest holder.
pub type IndicatorHandle = Arc<dyn ProgressIndicator>;

/// Callback type for bridging indicator updates to a front end.
///
/// Arguments: (state, range, message)
pub type ProgressCallback = Box<dyn Fn(u32, u32, &str) + Send + Sync>;

/// A bounded progress sequence with a current state and per-state message.
pub trait ProgressIndicator: Send + Sync {
    /// Move the indicator to `state` with a message for that state.
    fn update(&self, state: u32, message: &str);

    /// Number of states in the sequence.
    fn range(&self) -> u32;

    /// Title of the procedure this indicator tracks.
    fn title(&self) -> String;

    /// Current state.
    fn state(&self) -> u32;

    /// Show the indicator at its maximum state.
    fn finish(&self, message: &str) {
        self.update(self.range(), message);
    }
}

/// Headless indicator that records its state and reports through `tracing`.
///
/// This is what the default factory produces when no front end installed
/// anything better.
pub struct LogIndicator {
    title: String,
    range: u32,
    state: AtomicU32,
    message: Mutex<String>,
}

impl LogIndicator {
    pub fn new(range: u32, title: impl Into<String>, first_message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            range,
            state: AtomicU32::new(0),
            message: Mutex::new(first_message.into()),
        }
    }

    /// Message of the current state.
    pub fn message(&self) -> String {
        self.message.lock().clone()
    }
}

impl ProgressIndicator for LogIndicator {
    fn update(&self, state: u32, message: &str) {
        self.state.store(state, Ordering::SeqCst);
        *self.message.lock() = message.to_string();
        tracing::debug!(
            target: "slicer_control::progress",
            title = %self.title,
            state,
            range = self.range,
            "{}",
            message
        );
    }

    fn range(&self) -> u32 {
        self.range
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn state(&self) -> u32 {
        self.state.load(Ordering::SeqCst)
    }
}

/// Indicator that forwards every update to a front-end callback.
///
/// This is the bridge a UI uses to route stage progress into its own
/// widgets without the control layer knowing about them.
pub struct CallbackIndicator {
    title: String,
    range: u32,
    state: AtomicU32,
    callback: ProgressCallback,
}

impl CallbackIndicator {
    pub fn new(
        range: u32,
        title: impl Into<String>,
        callback: ProgressCallback,
    ) -> Self {
        Self {
            title: title.into(),
            range,
            state: AtomicU32::new(0),
            callback,
        }
    }
}

impl ProgressIndicator for CallbackIndicator {
    fn update(&self, state: u32, message: &str) {
        self.state.store(state, Ordering::SeqCst);
        (self.callback)(state, self.range, message);
    }

    fn range(&self) -> u32 {
        self.range
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn state(&self) -> u32 {
        self.state.load(Ordering::SeqCst)
    }
}
