//! Zipped-PNG layer export: configuration, the front-end query for it,
//! and the archive writer.
//!
//! Rasterization and PNG encoding belong to the geometry backend; this
//! module only carries the configuration and packs the finished bytes
//! into the output archive.

mod archive;
mod config;
mod query;

pub use archive::{ArchiveError, ArchiveResult, LayerArchive};
pub use config::PngExportConfig;
pub use query::{ExportQuery, HeadlessExportQuery};
