//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates.

use serde::{Deserialize, Serialize};

use crate::export::PngExportConfig;
use crate::logging::{LogConfig, LogLevel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// PNG export defaults.
    #[serde(default)]
    pub export: ExportSettings,
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for exported archives.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Last directory an export was written to.
    #[serde(default)]
    pub last_export_dir: String,
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
            last_export_dir: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for per-job log files.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Show timestamps in log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: default_progress_step(),
            show_timestamps: true,
        }
    }
}

impl LoggingSettings {
    /// Per-job logger configuration from these settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            progress_step: self.progress_step,
            show_timestamps: self.show_timestamps,
        }
    }
}

/// PNG export defaults, seeding the first export query of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default = "default_width_mm")]
    pub width_mm: f64,
    #[serde(default = "default_height_mm")]
    pub height_mm: f64,
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

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
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

impl ExportSettings {
    /// An export configuration seeded from these defaults, with no
    /// destination chosen yet.
    pub fn to_config(&self) -> PngExportConfig {
        PngExportConfig {
            width_px: self.width_px,
            height_px: self.height_px,
            width_mm: self.width_mm,
            height_mm: self.height_mm,
            corr_x: self.corr_x,
            corr_y: self.corr_y,
            corr_z: self.corr_z,
            ..PngExportConfig::default()
        }
    }
}

/// Identifies a settings section for atomic section-level updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Export,
}

impl ConfigSection {
    /// The TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Export => "export",
        }
    }
}
