//! Per-job pipeline controller.
//!
//! Drives the ordered print-preparation stages against one geometry
//! backend, binding a stage-appropriate progress indicator for the
//! executing thread on entry to each stage and translating backend
//! failures into issue reports.
//!
//! Error policy (fixed, not ad hoc): a whole-job stage failure fails the
//! job. A per-object unit failure is reported and the remaining objects
//! continue; the failed object is excluded from later per-object stages.
//! Only when every object of a stage failed does the stage - and the job -
//! fail. A fatal issue fails the job at the next stage or unit boundary;
//! an in-flight unit always runs to completion first.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::export::{ExportQuery, LayerArchive, PngExportConfig};
use crate::issue::{IssueKind, IssueReporter};
use crate::logging::JobLogger;
use crate::models::{Print, PrintError, PrintObject, PrintResult};
use crate::progress::{ProgressIndicator, ThreadProgressRegistry};

use super::stage::{JobError, JobPhase, JobResult, ObjectError, SliceSummary, Stage};

/// Controller for one slicing job.
///
/// Bound to exactly one print for its lifetime and destroyed with it;
/// create the next one through the scene controller.
pub struct PrintController {
    job_name: String,
    print: Arc<dyn Print>,
    registry: Arc<ThreadProgressRegistry>,
    reporter: IssueReporter,
    export_query: Arc<dyn ExportQuery>,
    logger: Arc<JobLogger>,
    phase: Mutex<JobPhase>,
    /// Objects excluded from later per-object stages by an earlier failure.
    failed_objects: Mutex<HashSet<usize>>,
    /// Last used export configuration, pre-populating the next query.
    prev_export: Mutex<PngExportConfig>,
}

impl PrintController {
    pub fn new(
        print: Arc<dyn Print>,
        registry: Arc<ThreadProgressRegistry>,
        reporter: IssueReporter,
        export_query: Arc<dyn ExportQuery>,
        logger: Arc<JobLogger>,
    ) -> Self {
        let job_name = print.name();
        Self {
            job_name,
            print,
            registry,
            reporter,
            export_query,
            logger,
            phase: Mutex::new(JobPhase::Idle),
            failed_objects: Mutex::new(HashSet::new()),
            prev_export: Mutex::new(PngExportConfig::default()),
        }
    }

    /// Seed the export configuration (typically from the `[export]`
    /// settings section).
    pub fn with_export_defaults(self, config: PngExportConfig) -> Self {
        *self.prev_export.lock() = config;
        self
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Current state of the job machine.
    pub fn phase(&self) -> JobPhase {
        *self.phase.lock()
    }

    pub fn print(&self) -> Arc<dyn Print> {
        Arc::clone(&self.print)
    }

    /// The issue reporter bound to this job.
    pub fn reporter(&self) -> &IssueReporter {
        &self.reporter
    }

    /// The export configuration the next query will be pre-populated with.
    pub fn last_export_config(&self) -> PngExportConfig {
        self.prev_export.lock().clone()
    }

    /// Slice the whole print: all stages in order, to `Done`.
    pub fn slice(&self) -> JobResult<SliceSummary> {
        match self.phase() {
            JobPhase::Idle => {}
            JobPhase::Done => {
                self.logger.info("Already sliced; nothing to do");
                return Ok(SliceSummary::default());
            }
            JobPhase::Running(stage) => {
                return Err(JobError::not_runnable(
                    &self.job_name,
                    format!("stage '{}' is still running", stage.name()),
                ));
            }
            JobPhase::Failed => {
                return Err(JobError::not_runnable(&self.job_name, "job has failed"));
            }
        }

        let objects = self.print.objects();
        self.logger.info(&format!(
            "Slicing '{}' ({} objects)",
            self.job_name,
            objects.len()
        ));

        let mut summary = SliceSummary::default();

        self.whole_job_stage(Stage::Skirt, |p| p.make_skirt())?;
        summary.stages_completed.push(Stage::Skirt.name());

        self.whole_job_stage(Stage::Brim, |p| p.make_brim())?;
        summary.stages_completed.push(Stage::Brim.name());

        self.whole_job_stage(Stage::WipeTower, |p| p.make_wipe_tower())?;
        summary.stages_completed.push(Stage::WipeTower.name());

        self.per_object_stage(Stage::Perimeters, &objects, &mut summary, |p, o| {
            p.make_perimeters(o)
        })?;
        summary.stages_completed.push(Stage::Perimeters.name());

        self.per_object_stage(Stage::Infill, &objects, &mut summary, |p, o| p.infill(o))?;
        summary.stages_completed.push(Stage::Infill.name());

        self.per_object_stage(Stage::Support, &objects, &mut summary, |p, o| {
            p.generate_support_material(o)
        })?;
        summary.stages_completed.push(Stage::Support.name());

        *self.phase.lock() = JobPhase::Done;
        self.logger.success("Slicing complete");
        Ok(summary)
    }

    /// Slice a single object: only the per-object stages, in order.
    ///
    /// Whole-job stages (skirt, brim, wipe tower) need knowledge of all
    /// objects and are not run here. A partial run does not drive the
    /// whole-job phase machine, so independent objects may be re-sliced
    /// concurrently from different worker threads; a failure is absorbing
    /// as usual.
    pub fn slice_object(&self, index: usize) -> JobResult<SliceSummary> {
        let objects = self.print.objects();
        let object = objects.get(index).cloned().ok_or_else(|| {
            JobError::not_runnable(&self.job_name, format!("no object at index {}", index))
        })?;

        if self.phase().is_failed() {
            return Err(JobError::not_runnable(&self.job_name, "job has failed"));
        }

        self.logger
            .info(&format!("Re-slicing object '{}'", object.name()));

        let mut summary = SliceSummary::default();
        self.single_object_stage(Stage::Perimeters, &object, |p, o| p.make_perimeters(o))?;
        summary.stages_completed.push(Stage::Perimeters.name());
        self.single_object_stage(Stage::Infill, &object, |p, o| p.infill(o))?;
        summary.stages_completed.push(Stage::Infill.name());
        self.single_object_stage(Stage::Support, &object, |p, o| {
            p.generate_support_material(o)
        })?;
        summary.stages_completed.push(Stage::Support.name());

        self.failed_objects.lock().remove(&index);
        self.logger
            .success(&format!("Object '{}' re-sliced", object.name()));
        Ok(summary)
    }

    /// Export the sliced print as zipped layer images, asking the front
    /// end for the destination and parameters.
    ///
    /// Chained after `Done`: an `Idle` job is sliced first. The export
    /// dialog lives in the front end, so this must be called from the
    /// main thread.
    pub fn slice_to_png(&self) -> JobResult<PathBuf> {
        self.ensure_sliced()?;

        if !self.registry.main_thread().is_main_thread() {
            return Err(JobError::main_thread_required("slice_to_png"));
        }

        let prev = self.prev_export.lock().clone();
        let config = match self.export_query.query_png_export(&prev) {
            Some(config) => config,
            None => {
                self.logger.info("PNG export cancelled");
                return Err(JobError::ExportCancelled);
            }
        };
        *self.prev_export.lock() = config.clone();

        self.export_layers(&config)
    }

    /// Export into `dir` under a filename derived from the print name,
    /// without querying the front end.
    pub fn slice_to_png_dir(&self, dir: impl AsRef<Path>) -> JobResult<PathBuf> {
        self.ensure_sliced()?;

        let config = self
            .prev_export
            .lock()
            .clone()
            .for_directory(dir, &self.print.name());
        *self.prev_export.lock() = config.clone();

        self.export_layers(&config)
    }

    /// Run the job to `Done` if it has not started yet; refuse when it is
    /// in any other non-`Done` phase.
    fn ensure_sliced(&self) -> JobResult<()> {
        if self.phase() == JobPhase::Idle {
            self.slice()?;
        }
        match self.phase() {
            JobPhase::Done => Ok(()),
            phase => Err(JobError::not_runnable(
                &self.job_name,
                format!("cannot export in phase {:?}", phase),
            )),
        }
    }

    fn export_layers(&self, config: &PngExportConfig) -> JobResult<PathBuf> {
        if self.reporter.is_fatal() {
            return Err(self.fail_fatal());
        }

        let layer_count = self.print.layer_count();
        self.logger.stage("PNG export");
        self.logger.info(&format!(
            "Exporting {} layers ({}x{} px, {}x{} mm) to {}",
            layer_count,
            config.width_px,
            config.height_px,
            config.width_mm,
            config.height_mm,
            config.zip_path.display()
        ));

        let indicator =
            self.registry
                .bind(layer_count as u32, "Exporting layers", "Preparing archive");

        let mut archive = LayerArchive::create(&config.zip_path)
            .map_err(|err| self.export_failure(&config.zip_path, err.to_string()))?;

        for index in 0..layer_count {
            let image = self
                .print
                .rasterize_layer(index, config)
                .map_err(|err| self.export_failure(&config.zip_path, format!("layer {}: {}", index, err)))?;
            archive
                .push_layer(&image)
                .map_err(|err| self.export_failure(&config.zip_path, err.to_string()))?;
            indicator.update(
                (index + 1) as u32,
                &format!("Layer {}/{}", index + 1, layer_count),
            );
        }

        let path = archive
            .finish()
            .map_err(|err| self.export_failure(&config.zip_path, err.to_string()))?;
        self.logger.success(&format!(
            "Exported {} layers to {}",
            layer_count,
            path.display()
        ));
        Ok(path)
    }

    /// Transition guard and entry bookkeeping shared by every stage.
    fn enter_stage(&self, stage: Stage) -> JobResult<()> {
        if self.reporter.is_fatal() {
            return Err(self.fail_fatal());
        }
        *self.phase.lock() = JobPhase::Running(stage);
        self.logger.stage(stage.name());
        Ok(())
    }

    fn whole_job_stage(
        &self,
        stage: Stage,
        op: impl Fn(&dyn Print) -> PrintResult<()>,
    ) -> JobResult<()> {
        self.enter_stage(stage)?;
        let indicator = self.registry.bind(1, stage.name(), "Starting");

        match op(self.print.as_ref()) {
            Ok(()) => {
                indicator.finish(&format!("{} complete", stage.name()));
                self.logger.debug(&format!("{} done", stage.name()));
                Ok(())
            }
            Err(err) => Err(self.stage_failure(stage, &err)),
        }
    }

    fn per_object_stage(
        &self,
        stage: Stage,
        objects: &[Arc<dyn PrintObject>],
        summary: &mut SliceSummary,
        op: impl Fn(&dyn Print, &dyn PrintObject) -> PrintResult<()>,
    ) -> JobResult<()> {
        self.enter_stage(stage)?;
        let indicator = self
            .registry
            .bind(objects.len() as u32, stage.name(), "Starting");

        let mut failed = 0usize;
        for (index, object) in objects.iter().enumerate() {
            // Fatal is cooperative: checked at unit boundaries, never
            // mid-unit.
            if self.reporter.is_fatal() {
                return Err(self.fail_fatal());
            }

            if self.failed_objects.lock().contains(&index) {
                failed += 1;
                self.logger.warn(&format!(
                    "Skipping '{}': an earlier stage failed for it",
                    object.name()
                ));
                indicator.update((index + 1) as u32, &format!("{} (skipped)", object.name()));
                continue;
            }

            match op(self.print.as_ref(), object.as_ref()) {
                Ok(()) => {
                    self.logger
                        .debug(&format!("{}: {} done", stage.name(), object.name()));
                    indicator.update((index + 1) as u32, &object.name());
                }
                Err(err) => {
                    failed += 1;
                    self.failed_objects.lock().insert(index);
                    let description =
                        format!("{}: {} failed: {}", stage.name(), object.name(), err);
                    let kind = if err.is_fatal() {
                        IssueKind::Fatal
                    } else {
                        IssueKind::Error
                    };
                    self.reporter.report(kind, description.clone(), stage.name());
                    self.logger.error(&description);
                    if !err.is_fatal() {
                        summary.object_errors.push(ObjectError {
                            stage: stage.name(),
                            object: object.name(),
                            message: err.to_string(),
                        });
                    }
                    indicator.update((index + 1) as u32, &format!("{} failed", object.name()));
                }
            }
        }

        if self.reporter.is_fatal() {
            return Err(self.fail_fatal());
        }

        if !objects.is_empty() && failed == objects.len() {
            *self.phase.lock() = JobPhase::Failed;
            self.logger
                .error(&format!("{}: every object failed", stage.name()));
            return Err(JobError::stage_failed(
                &self.job_name,
                stage.name(),
                "every object failed",
            ));
        }

        indicator.finish(&format!("{} complete", stage.name()));
        Ok(())
    }

    fn single_object_stage(
        &self,
        stage: Stage,
        object: &Arc<dyn PrintObject>,
        op: impl Fn(&dyn Print, &dyn PrintObject) -> PrintResult<()>,
    ) -> JobResult<()> {
        if self.reporter.is_fatal() {
            return Err(self.fail_fatal());
        }
        let title = format!("{}: {}", stage.name(), object.name());
        self.logger.stage(&title);
        let indicator = self.registry.bind(1, &title, "Starting");

        match op(self.print.as_ref(), object.as_ref()) {
            Ok(()) => {
                indicator.finish(&format!("{} complete", stage.name()));
                Ok(())
            }
            Err(err) => Err(self.stage_failure(stage, &err)),
        }
    }

    /// Report a stage-level failure and move the machine to `Failed`.
    fn stage_failure(&self, stage: Stage, err: &PrintError) -> JobError {
        let description = format!("{} failed: {}", stage.name(), err);
        let kind = if err.is_fatal() {
            IssueKind::Fatal
        } else {
            IssueKind::Error
        };
        self.reporter.report(kind, description.clone(), stage.name());
        self.logger.error(&description);
        *self.phase.lock() = JobPhase::Failed;

        if err.is_fatal() {
            JobError::fatal(&self.job_name, err.to_string())
        } else {
            JobError::stage_failed(&self.job_name, stage.name(), err.to_string())
        }
    }

    fn fail_fatal(&self) -> JobError {
        *self.phase.lock() = JobPhase::Failed;
        self.logger
            .error("Job is unrecoverable; skipping remaining work");
        JobError::fatal(&self.job_name, "a fatal issue was reported")
    }

    /// Report an export failure with the failing path; the export halts
    /// but the prepared print stays `Done`.
    fn export_failure(&self, path: &Path, message: String) -> JobError {
        let description = format!("PNG export to {} failed: {}", path.display(), message);
        self.reporter
            .report(IssueKind::Error, description.clone(), "PNG export");
        self.logger.error(&description);
        JobError::export_failed(path, message)
    }
}
