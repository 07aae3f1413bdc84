//! Issue reporting: surfacing informational, warning, error, and fatal
//! conditions to whatever front end is attached.
//!
//! The control layer never renders anything itself. It hands each
//! [`IssueReport`] to the attached [`IssueSink`] exactly once; only a
//! blocking warning ([`IssueKind::WarnBlocking`]) waits for an answer, and
//! only on the main thread.

mod reporter;
mod types;

pub use reporter::{HeadlessSink, IssueReporter, IssueSink};
pub use types::{IssueKind, IssueReport};
