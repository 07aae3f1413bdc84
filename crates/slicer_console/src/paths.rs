//! Path queries answered from presets instead of dialogs.

use std::path::{Path, PathBuf};

use slicer_control::models::PathQuery;

/// Answers destination queries from values configured up front (command
/// line arguments), the console stand-in for a file chooser.
#[derive(Debug, Default)]
pub struct PresetPathQuery {
    paths: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl PresetPathQuery {
    pub fn new(paths: Vec<PathBuf>, dirs: Vec<PathBuf>) -> Self {
        Self { paths, dirs }
    }
}

impl PathQuery for PresetPathQuery {
    fn query_paths(&self, _title: &str, _extensions: &str) -> Vec<PathBuf> {
        self.paths.clone()
    }

    fn query_dirs(&self, _title: &str) -> Vec<PathBuf> {
        self.dirs.clone()
    }

    fn query_path(&self, _title: &str, _extensions: &str, hint: Option<&Path>) -> Option<PathBuf> {
        self.paths
            .first()
            .cloned()
            .or_else(|| hint.map(Path::to_path_buf))
    }
}
