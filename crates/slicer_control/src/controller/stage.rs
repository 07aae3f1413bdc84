//! Pipeline stages, the job state machine, and controller errors.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// One discrete phase of print preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Skirt,
    Brim,
    WipeTower,
    Perimeters,
    Infill,
    Support,
}

impl Stage {
    /// Full pipeline order for a whole-job run.
    pub const ORDER: [Stage; 6] = [
        Stage::Skirt,
        Stage::Brim,
        Stage::WipeTower,
        Stage::Perimeters,
        Stage::Infill,
        Stage::Support,
    ];

    /// The stages repeated once per print object.
    pub const PER_OBJECT: [Stage; 3] = [Stage::Perimeters, Stage::Infill, Stage::Support];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Skirt => "Skirt",
            Stage::Brim => "Brim",
            Stage::WipeTower => "Wipe tower",
            Stage::Perimeters => "Perimeters",
            Stage::Infill => "Infill",
            Stage::Support => "Support material",
        }
    }

    /// Whether this stage is repeated once per print object.
    pub fn is_per_object(&self) -> bool {
        matches!(self, Stage::Perimeters | Stage::Infill | Stage::Support)
    }
}

/// State machine of one slicing job.
///
/// `Idle → Skirt → Brim → WipeTower → Perimeters → Infill → Support →
/// Done`, with `Failed` absorbing from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Running(Stage),
    Done,
    Failed,
}

impl JobPhase {
    pub fn is_done(&self) -> bool {
        matches!(self, JobPhase::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobPhase::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_done() || self.is_failed()
    }
}

/// Controller-layer error with job context.
#[derive(Error, Debug)]
pub enum JobError {
    /// A stage failed and the job moved to `Failed`.
    #[error("Job '{job}' failed at stage '{stage}': {message}")]
    StageFailed {
        job: String,
        stage: &'static str,
        message: String,
    },

    /// A fatal issue was reported; the job is irrecoverable.
    #[error("Job '{job}' is unrecoverable: {message}")]
    Fatal { job: String, message: String },

    /// The requested operation is not legal in the job's current phase.
    #[error("Job '{job}' cannot run: {message}")]
    NotRunnable { job: String, message: String },

    /// A front-end query was issued off the main thread.
    #[error("'{operation}' must be called from the main thread")]
    MainThreadRequired { operation: String },

    /// The user cancelled the export query.
    #[error("export cancelled")]
    ExportCancelled,

    /// Writing the export archive (or rasterizing into it) failed.
    #[error("export to {path} failed: {message}")]
    ExportFailed { path: PathBuf, message: String },

    /// Failed to set up a job (log directory, etc.).
    #[error("failed to set up job '{job}': {source}")]
    Setup {
        job: String,
        #[source]
        source: io::Error,
    },
}

impl JobError {
    pub fn stage_failed(
        job: impl Into<String>,
        stage: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::StageFailed {
            job: job.into(),
            stage,
            message: message.into(),
        }
    }

    pub fn fatal(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fatal {
            job: job.into(),
            message: message.into(),
        }
    }

    pub fn not_runnable(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotRunnable {
            job: job.into(),
            message: message.into(),
        }
    }

    pub fn main_thread_required(operation: impl Into<String>) -> Self {
        Self::MainThreadRequired {
            operation: operation.into(),
        }
    }

    pub fn export_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ExportFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn setup(job: impl Into<String>, source: io::Error) -> Self {
        Self::Setup {
            job: job.into(),
            source,
        }
    }
}

/// Result type for controller operations.
pub type JobResult<T> = Result<T, JobError>;

/// Per-object failure recorded during a per-object stage.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectError {
    pub stage: &'static str,
    pub object: String,
    pub message: String,
}

/// Result of a completed pipeline run. Serializable so front ends can
/// persist or display it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SliceSummary {
    /// Stages that ran to completion, in order.
    pub stages_completed: Vec<&'static str>,
    /// Objects that failed a per-object stage. The job still completed;
    /// these objects were skipped in later per-object stages.
    pub object_errors: Vec<ObjectError>,
}

impl SliceSummary {
    /// True when every object survived every stage.
    pub fn all_clean(&self) -> bool {
        self.object_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        let names: Vec<_> = Stage::ORDER.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "Skirt",
                "Brim",
                "Wipe tower",
                "Perimeters",
                "Infill",
                "Support material"
            ]
        );
    }

    #[test]
    fn per_object_stages_are_the_last_three() {
        for stage in Stage::PER_OBJECT {
            assert!(stage.is_per_object());
        }
        assert!(!Stage::Skirt.is_per_object());
        assert!(!Stage::WipeTower.is_per_object());
    }

    #[test]
    fn job_error_displays_context() {
        let err = JobError::stage_failed("tower", "Perimeters", "no contour");
        let msg = err.to_string();
        assert!(msg.contains("tower"));
        assert!(msg.contains("Perimeters"));
        assert!(msg.contains("no contour"));
    }

    #[test]
    fn summary_serializes() {
        let summary = SliceSummary {
            stages_completed: vec!["Skirt", "Brim"],
            object_errors: vec![ObjectError {
                stage: "Perimeters",
                object: "tower".to_string(),
                message: "no contour".to_string(),
            }],
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"stages_completed\":[\"Skirt\",\"Brim\"]"));
        assert!(json.contains("\"object\":\"tower\""));
    }

    #[test]
    fn phase_terminality() {
        assert!(!JobPhase::Idle.is_terminal());
        assert!(!JobPhase::Running(Stage::Brim).is_terminal());
        assert!(JobPhase::Done.is_terminal());
        assert!(JobPhase::Failed.is_terminal());
    }
}
