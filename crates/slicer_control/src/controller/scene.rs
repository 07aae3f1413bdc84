//! Top-level application controller.
//!
//! Constructed on the main thread, whose identity it captures. Owns the
//! process-wide progress registry and the attached collaborators, and
//! creates one print controller per job. Free of any UI toolkit
//! dependency; a GUI, a console, or a test harness attaches through the
//! capability traits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::export::{ExportQuery, HeadlessExportQuery};
use crate::identity::MainThreadIdentity;
use crate::issue::{HeadlessSink, IssueKind, IssueReporter, IssueSink};
use crate::logging::JobLogger;
use crate::models::{Model, NullPathQuery, PathQuery, Print};
use crate::progress::{
    IndicatorFactory, IndicatorHandle, LogIndicatorFactory, ThreadProgressRegistry,
};

use super::print::PrintController;
use super::stage::{JobError, JobResult};

/// Top-level controller for the slicing application.
pub struct SceneController {
    identity: MainThreadIdentity,
    registry: Arc<ThreadProgressRegistry>,
    reporter: IssueReporter,
    paths: Arc<dyn PathQuery>,
    export_query: Arc<dyn ExportQuery>,
    settings: Settings,
    model: Mutex<Option<Arc<dyn Model>>>,
    print_ctl: Mutex<Option<Arc<PrintController>>>,
}

impl SceneController {
    /// Builder with headless defaults for every collaborator.
    pub fn builder() -> SceneControllerBuilder {
        SceneControllerBuilder::new()
    }

    /// Fully headless controller; equivalent to `builder().build()`.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// True only on the thread that constructed this controller.
    pub fn is_main_thread(&self) -> bool {
        self.identity.is_main_thread()
    }

    pub fn main_thread(&self) -> MainThreadIdentity {
        self.identity
    }

    /// The process-wide thread-to-indicator registry.
    pub fn registry(&self) -> &Arc<ThreadProgressRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Install the front end's aggregate indicator (the status-bar gauge).
    ///
    /// Set once at startup by the hosting application; main-thread stage
    /// updates mirror into it from then on.
    pub fn set_global_progress_indicator(&self, handle: IndicatorHandle) {
        self.registry.set_global(handle);
    }

    /// Report an issue outside any job.
    pub fn report_issue(
        &self,
        kind: IssueKind,
        description: impl Into<String>,
        brief: impl Into<String>,
    ) -> bool {
        self.reporter.report(kind, description, brief)
    }

    /// Store the loaded model scene on behalf of the host.
    pub fn set_model(&self, model: Arc<dyn Model>) {
        *self.model.lock() = Some(model);
    }

    pub fn model(&self) -> Option<Arc<dyn Model>> {
        self.model.lock().clone()
    }

    /// Create the print controller for the next job.
    ///
    /// Wires the job to the shared registry, derives a job reporter with a
    /// fresh fatal flag, opens the per-job log file, and seeds the export
    /// configuration from the `[export]` settings section. When a global
    /// indicator is installed and the main thread has no binding yet, the
    /// job starts out driving the global indicator.
    pub fn set_print(&self, print: Arc<dyn Print>) -> JobResult<Arc<PrintController>> {
        let job_name = print.name();
        let logger = JobLogger::new(
            &job_name,
            PathBuf::from(&self.settings.paths.logs_folder),
            self.settings.logging.to_log_config(),
            None,
        )
        .map_err(|source| JobError::setup(&job_name, source))?;

        if self.registry.get_for(self.identity.id()).is_none() {
            if let Some(global) = self.registry.global() {
                self.registry.set_for(self.identity.id(), global);
            }
        }

        let controller = Arc::new(
            PrintController::new(
                print,
                Arc::clone(&self.registry),
                self.reporter.for_new_job(),
                Arc::clone(&self.export_query),
                Arc::new(logger),
            )
            .with_export_defaults(self.settings.export.to_config()),
        );

        *self.print_ctl.lock() = Some(Arc::clone(&controller));
        tracing::info!(job = %job_name, "print controller created");
        Ok(controller)
    }

    /// The current job's print controller, shared at the boundary so a
    /// host layer (scripting bindings, UI) can drive it directly.
    pub fn print_ctl(&self) -> Option<Arc<PrintController>> {
        self.print_ctl.lock().clone()
    }

    /// Ask the user for destination file paths.
    ///
    /// Front-end dialogs only exist on the main thread; calling this from
    /// a worker is a programming error and fails fast.
    pub fn query_destination_paths(
        &self,
        title: &str,
        extensions: &str,
    ) -> JobResult<Vec<PathBuf>> {
        self.require_main_thread("query_destination_paths")?;
        Ok(self.paths.query_paths(title, extensions))
    }

    /// Ask the user for destination directories.
    pub fn query_destination_dirs(&self, title: &str) -> JobResult<Vec<PathBuf>> {
        self.require_main_thread("query_destination_dirs")?;
        Ok(self.paths.query_dirs(title))
    }

    /// Ask the user for a single destination path.
    pub fn query_destination_path(
        &self,
        title: &str,
        extensions: &str,
        hint: Option<&Path>,
    ) -> JobResult<Option<PathBuf>> {
        self.require_main_thread("query_destination_path")?;
        Ok(self.paths.query_path(title, extensions, hint))
    }

    fn require_main_thread(&self, operation: &str) -> JobResult<()> {
        if self.identity.is_main_thread() {
            Ok(())
        } else {
            tracing::error!(operation, "front-end query issued off the main thread");
            Err(JobError::main_thread_required(operation))
        }
    }
}

impl Default for SceneController {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a [`SceneController`] with fluent collaborator wiring.
pub struct SceneControllerBuilder {
    factory: Arc<dyn IndicatorFactory>,
    sink: Arc<dyn IssueSink>,
    paths: Arc<dyn PathQuery>,
    export_query: Arc<dyn ExportQuery>,
    settings: Settings,
}

impl SceneControllerBuilder {
    pub fn new() -> Self {
        Self {
            factory: Arc::new(LogIndicatorFactory),
            sink: Arc::new(HeadlessSink::default()),
            paths: Arc::new(NullPathQuery),
            export_query: Arc::new(HeadlessExportQuery),
            settings: Settings::default(),
        }
    }

    /// Use the front end's indicator factory.
    pub fn indicator_factory(mut self, factory: Arc<dyn IndicatorFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Attach the issue sink.
    pub fn issue_sink(mut self, sink: Arc<dyn IssueSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attach the path-query collaborator.
    pub fn path_query(mut self, paths: Arc<dyn PathQuery>) -> Self {
        self.paths = paths;
        self
    }

    /// Attach the export-query collaborator.
    pub fn export_query(mut self, export_query: Arc<dyn ExportQuery>) -> Self {
        self.export_query = export_query;
        self
    }

    /// Use loaded application settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the controller, capturing the calling thread as the main
    /// thread.
    pub fn build(self) -> SceneController {
        let identity = MainThreadIdentity::capture();
        let registry = Arc::new(ThreadProgressRegistry::new(identity, self.factory));
        let reporter = IssueReporter::new(self.sink, identity);

        SceneController {
            identity,
            registry,
            reporter,
            paths: self.paths,
            export_query: self.export_query,
            settings: self.settings,
            model: Mutex::new(None),
            print_ctl: Mutex::new(None),
        }
    }
}

impl Default for SceneControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
