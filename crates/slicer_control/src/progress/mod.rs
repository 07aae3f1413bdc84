//! Thread-indexed progress reporting.
//!
//! Concurrently running pipeline stages, each on its own worker thread,
//! obtain and update a dedicated progress indicator through the
//! [`ThreadProgressRegistry`] without contending for the front end. A
//! separate global indicator slot mirrors whatever the recorded main
//! thread reports.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use slicer_control::identity::MainThreadIdentity;
//! use slicer_control::progress::{
//!     LogIndicatorFactory, ProgressIndicator, ThreadProgressRegistry,
//! };
//!
//! let registry = ThreadProgressRegistry::new(
//!     MainThreadIdentity::capture(),
//!     Arc::new(LogIndicatorFactory),
//! );
//!
//! // Any stage, on any thread:
//! let indicator = registry.get_or_create(10, "Perimeters", "Starting");
//! indicator.update(1, "object 1");
//! ```

mod factory;
mod indicator;
mod registry;

pub use factory::{IndicatorFactory, LogIndicatorFactory};
pub use indicator::{
    CallbackIndicator, IndicatorHandle, LogIndicator, ProgressCallback, ProgressIndicator,
};
pub use registry::ThreadProgressRegistry;
