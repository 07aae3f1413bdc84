//! Control layer for the slicer.
//!
//! This crate contains the UI-agnostic control logic of the application:
//! the thread-indexed progress registry, issue reporting, the pipeline
//! controllers, configuration, and per-job logging. It has zero UI
//! dependencies; a GUI, a console front end, or a test harness attaches
//! through the capability traits in [`progress`], [`issue`], [`models`],
//! and [`export`].
//!
//! The geometry backend (`Print`, `Model`, `PrintObject`) is an external
//! collaborator: slicing algorithms, rasterization, and image encoding
//! all live behind the traits in [`models`].

pub mod config;
pub mod controller;
pub mod export;
pub mod identity;
pub mod issue;
pub mod logging;
pub mod models;
pub mod progress;

pub use controller::{PrintController, SceneController};
pub use identity::MainThreadIdentity;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
