//! Issue reporter and the sink capability it delivers to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::identity::MainThreadIdentity;

use super::types::{IssueKind, IssueReport};

/// Receives issue reports from the control layer.
///
/// Exactly one sink is attached per top-level controller. `decide` is only
/// ever called on the recorded main thread; a sink without an interactive
/// surface answers with a fixed policy.
pub trait IssueSink: Send + Sync {
    /// Deliver a non-blocking notification.
    fn notify(&self, report: &IssueReport);

    /// Deliver a blocking warning and return the continue/abort decision
    /// (`true` = continue).
    fn decide(&self, report: &IssueReport) -> bool;
}

/// Sink for headless operation: routes reports to `tracing` and answers
/// blocking warnings with a fixed decision (abort by default).
pub struct HeadlessSink {
    blocking_decision: bool,
}

impl HeadlessSink {
    pub fn new(blocking_decision: bool) -> Self {
        Self { blocking_decision }
    }
}

impl Default for HeadlessSink {
    fn default() -> Self {
        Self::new(false)
    }
}

impl IssueSink for HeadlessSink {
    fn notify(&self, report: &IssueReport) {
        match report.kind {
            IssueKind::Info => {
                tracing::info!(brief = %report.brief, "{}", report.description)
            }
            IssueKind::Warn | IssueKind::WarnBlocking => {
                tracing::warn!(brief = %report.brief, "{}", report.description)
            }
            IssueKind::Error | IssueKind::Fatal => {
                tracing::error!(brief = %report.brief, "{}", report.description)
            }
        }
    }

    fn decide(&self, report: &IssueReport) -> bool {
        self.notify(report);
        self.blocking_decision
    }
}

/// Surfaces issues to the attached sink and tracks whether the enclosing
/// job has become irrecoverable.
///
/// Cloning shares the sink, the main-thread identity, and the fatal flag;
/// [`for_new_job`](Self::for_new_job) derives a reporter with a fresh flag
/// for the next job.
#[derive(Clone)]
pub struct IssueReporter {
    sink: Arc<dyn IssueSink>,
    main_thread: MainThreadIdentity,
    fatal: Arc<AtomicBool>,
}

impl IssueReporter {
    pub fn new(sink: Arc<dyn IssueSink>, main_thread: MainThreadIdentity) -> Self {
        Self {
            sink,
            main_thread,
            fatal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report an issue. Every report reaches the sink exactly once,
    /// synchronously, before this returns.
    ///
    /// Returns the caller decision for [`IssueKind::WarnBlocking`] and
    /// `true` for everything else. A blocking warning raised off the main
    /// thread never blocks: decision surfaces only exist on the main
    /// thread, so it is delivered as a plain notification and answered
    /// with the non-interactive default `false` (abort).
    pub fn report(
        &self,
        kind: IssueKind,
        description: impl Into<String>,
        brief: impl Into<String>,
    ) -> bool {
        let report = IssueReport::new(kind, description, brief);
        match report.kind {
            IssueKind::WarnBlocking => {
                if self.main_thread.is_main_thread() {
                    self.sink.decide(&report)
                } else {
                    self.sink.notify(&report);
                    false
                }
            }
            IssueKind::Fatal => {
                self.sink.notify(&report);
                self.fatal.store(true, Ordering::SeqCst);
                true
            }
            _ => {
                self.sink.notify(&report);
                true
            }
        }
    }

    /// Whether a fatal issue has been reported for this job.
    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::SeqCst)
    }

    /// Reporter for the next job: same sink and identity, fresh fatal flag.
    pub fn for_new_job(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            main_thread: self.main_thread,
            fatal: Arc::new(AtomicBool::new(false)),
        }
    }
}
