//! Terminal progress indicators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use slicer_control::progress::{IndicatorFactory, IndicatorHandle, ProgressIndicator};

/// Indicator that renders progress as plain lines on stderr.
pub struct ConsoleIndicator {
    title: String,
    range: u32,
    state: AtomicU32,
}

impl ConsoleIndicator {
    pub fn new(range: u32, title: impl Into<String>, first_message: &str) -> Self {
        let title = title.into();
        if !first_message.is_empty() {
            eprintln!("[{}] {}", title, first_message);
        }
        Self {
            title,
            range,
            state: AtomicU32::new(0),
        }
    }
}

impl ProgressIndicator for ConsoleIndicator {
    fn update(&self, state: u32, message: &str) {
        self.state.store(state, Ordering::SeqCst);
        eprintln!("[{}] {}/{} {}", self.title, state, self.range, message);
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

/// Factory handed to the scene controller so every stage gets a console
/// indicator.
#[derive(Debug, Default)]
pub struct ConsoleIndicatorFactory;

impl IndicatorFactory for ConsoleIndicatorFactory {
    fn create(&self, state_count: u32, title: &str, first_message: &str) -> IndicatorHandle {
        Arc::new(ConsoleIndicator::new(state_count, title, first_message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_state() {
        let indicator = ConsoleIndicator::new(3, "Skirt", "");
        indicator.update(2, "loops");
        assert_eq!(indicator.state(), 2);
        assert_eq!(indicator.range(), 3);
        assert_eq!(indicator.title(), "Skirt");
    }

    #[test]
    fn factory_creates_console_indicators() {
        let handle = ConsoleIndicatorFactory.create(4, "Infill", "");
        assert_eq!(handle.range(), 4);
        assert_eq!(handle.title(), "Infill");
    }
}
