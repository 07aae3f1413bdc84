//! Configuration management for the control layer.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is modified)
//!
//! # Example
//!
//! ```no_run
//! use slicer_control::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! config.settings_mut().export.width_px = 720;
//! config.update_section(ConfigSection::Export).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{ConfigSection, ExportSettings, LoggingSettings, PathSettings, Settings};
