//! Export-configuration query capability.

use super::config::PngExportConfig;

/// Asks the front end for an export configuration.
///
/// A UI shows the export dialog pre-populated with `prev`; the controllers
/// only issue this query from the main thread.
pub trait ExportQuery: Send + Sync {
    /// `None` means the user cancelled the export.
    fn query_png_export(&self, prev: &PngExportConfig) -> Option<PngExportConfig>;
}

/// Export query for headless operation: accepts the previous configuration
/// unchanged.
#[derive(Debug, Default)]
pub struct HeadlessExportQuery;

impl ExportQuery for HeadlessExportQuery {
    fn query_png_export(&self, prev: &PngExportConfig) -> Option<PngExportConfig> {
        Some(prev.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_query_accepts_previous_config() {
        let prev = PngExportConfig::default().with_zip_path("archive.zip");
        let answer = HeadlessExportQuery.query_png_export(&prev);
        assert_eq!(answer, Some(prev));
    }
}
