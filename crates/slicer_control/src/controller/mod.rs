//! Controllers orchestrating the print-preparation pipeline.
//!
//! # Architecture
//!
//! ```text
//! SceneController                 (one per application, main thread)
//!     └── PrintController         (one per job)
//!             ├── Stage: Skirt
//!             ├── Stage: Brim
//!             ├── Stage: Wipe tower
//!             ├── Stage: Perimeters   (per object)
//!             ├── Stage: Infill       (per object)
//!             ├── Stage: Support      (per object)
//!             └── PNG export          (chained after Done)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use slicer_control::controller::SceneController;
//!
//! let scene = SceneController::builder()
//!     .issue_sink(my_sink)
//!     .indicator_factory(my_factory)
//!     .build();
//!
//! let job = scene.set_print(print)?;
//! let summary = job.slice()?;
//! println!("completed: {:?}", summary.stages_completed);
//! ```

mod print;
mod scene;
mod stage;

pub use print::PrintController;
pub use scene::{SceneController, SceneControllerBuilder};
pub use stage::{JobError, JobPhase, JobResult, ObjectError, SliceSummary, Stage};
