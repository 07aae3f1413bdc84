//! Issue sink for the terminal.

use dialoguer::Confirm;

use slicer_control::issue::{IssueKind, IssueReport, IssueSink};

/// Routes issue reports to stderr; blocking warnings become an interactive
/// confirm prompt when a terminal is attached.
pub struct ConsoleSink {
    interactive: bool,
}

impl ConsoleSink {
    /// `interactive` controls whether blocking warnings prompt the user;
    /// when false they are answered with abort, like any headless sink.
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    fn prefix(kind: IssueKind) -> &'static str {
        match kind {
            IssueKind::Info => "[INFO]",
            IssueKind::Warn | IssueKind::WarnBlocking => "[WARNING]",
            IssueKind::Error => "[ERROR]",
            IssueKind::Fatal => "[FATAL]",
        }
    }
}

impl IssueSink for ConsoleSink {
    fn notify(&self, report: &IssueReport) {
        if report.brief.is_empty() {
            eprintln!("{} {}", Self::prefix(report.kind), report.description);
        } else {
            eprintln!(
                "{} {}: {}",
                Self::prefix(report.kind),
                report.brief,
                report.description
            );
        }
    }

    fn decide(&self, report: &IssueReport) -> bool {
        if !self.interactive {
            self.notify(report);
            return false;
        }

        Confirm::new()
            .with_prompt(format!("{} - continue?", report.description))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
