//! Indicator factory capability.

use std::sync::Arc;

use super::indicator::{IndicatorHandle, LogIndicator};

/// Creates progress indicators on behalf of the registry.
///
/// The registry calls this on a cache miss (or an explicit bind) and never
/// otherwise. A front end supplies its own factory to get indicators
/// rendered in its widgets.
pub trait IndicatorFactory: Send + Sync {
    fn create(&self, state_count: u32, title: &str, first_message: &str) -> IndicatorHandle;
}

/// Default factory producing tracing-backed [`LogIndicator`]s.
#[derive(Debug, Default)]
pub struct LogIndicatorFactory;

impl IndicatorFactory for LogIndicatorFactory {
    fn create(&self, state_count: u32, title: &str, first_message: &str) -> IndicatorHandle {
        Arc::new(LogIndicator::new(state_count, title, first_message))
    }
}
