//! Path-query capability for user-chosen destinations.

use std::path::{Path, PathBuf};

/// Asks the user for destination paths.
///
/// A UI front end shows file choosers; a console front end answers from
/// presets or arguments. These queries MUST only be issued from the main
/// thread; the controllers enforce that before delegating here.
pub trait PathQuery: Send + Sync {
    /// Query any number of file paths. `extensions` is a filter like
    /// `"zip"` or `"png,zip"`.
    fn query_paths(&self, title: &str, extensions: &str) -> Vec<PathBuf>;

    /// Same, for directories only.
    fn query_dirs(&self, title: &str) -> Vec<PathBuf>;

    /// Query a single path, optionally seeded with a hint.
    fn query_path(&self, title: &str, extensions: &str, hint: Option<&Path>) -> Option<PathBuf>;
}

/// Path query for headless operation: answers every query with nothing
/// (a single-path query echoes the hint).
#[derive(Debug, Default)]
pub struct NullPathQuery;

impl PathQuery for NullPathQuery {
    fn query_paths(&self, _title: &str, _extensions: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    fn query_dirs(&self, _title: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    fn query_path(&self, _title: &str, _extensions: &str, hint: Option<&Path>) -> Option<PathBuf> {
        hint.map(Path::to_path_buf)
    }
}
