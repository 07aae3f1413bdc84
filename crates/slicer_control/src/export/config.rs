//! PNG export configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Input data for the zipped-PNG export stage.
///
/// The print controller retains the last-used instance to pre-populate the
/// next query dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PngExportConfig {
    /// Output zip archive path.
    #[serde(default)]
    pub zip_path: PathBuf,

    /// Resolution in pixels.
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,

    /// Physical dimensions in millimeters.
    #[serde(default = "default_width_mm")]
    pub width_mm: f64,
    #[serde(default = "default_height_mm")]
    pub height_mm: f64,

    /// Correction factors per axis.
    #[serde(default = "default_corr")]
    pub corr_x: f64,
    #[serde(default = "default_corr")]
    pub corr_y: f64,
    #[serde(default = "default_corr")]
    pub corr_z: f64,
}

fn default_width_px() -> u32 {
    1440
}

fn default_height_px() -> u32 {
    2560
}

fn default_width_mm() -> f64 {
    68.0
}

fn default_height_mm() -> f64 {
    120.0
}

fn default_corr() -> f64 {
    1.0
}

impl Default for PngExportConfig {
    fn default() -> Self {
        Self {
            zip_path: PathBuf::new(),
            width_px: default_width_px(),
            height_px: default_height_px(),
            width_mm: default_width_mm(),
            height_mm: default_height_mm(),
            corr_x: default_corr(),
            corr_y: default_corr(),
            corr_z: default_corr(),
        }
    }
}

impl PngExportConfig {
    /// The same configuration pointed at a different archive path.
    pub fn with_zip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.zip_path = path.into();
        self
    }

    /// Derive an archive path inside `dir` from the print name.
    pub fn for_directory(self, dir: impl AsRef<Path>, print_name: &str) -> Self {
        let file_name = format!("{}.zip", sanitize_file_name(print_name));
        self.with_zip_path(dir.as_ref().join(file_name))
    }
}

/// Sanitize a print name for use as a filename.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_export_dialog() {
        let config = PngExportConfig::default();
        assert_eq!(config.width_px, 1440);
        assert_eq!(config.height_px, 2560);
        assert_eq!(config.width_mm, 68.0);
        assert_eq!(config.height_mm, 120.0);
        assert_eq!(config.corr_x, 1.0);
        assert_eq!(config.corr_y, 1.0);
        assert_eq!(config.corr_z, 1.0);
        assert_eq!(config.zip_path, PathBuf::new());
    }

    #[test]
    fn directory_export_derives_a_safe_filename() {
        let config = PngExportConfig::default().for_directory("/tmp/out", "tower: v2");
        assert_eq!(config.zip_path, PathBuf::from("/tmp/out/tower_ v2.zip"));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = PngExportConfig::default().with_zip_path("out.zip");
        let text = toml::to_string(&config).unwrap();
        let back: PngExportConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
