//! Layer archive writer.
//!
//! Collects the rasterized layers of one export run into a single zip
//! archive, one entry per layer. The image bytes arrive already encoded
//! from the geometry backend and are stored as-is.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::LayerImage;

/// Errors from writing a layer archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("failed to create archive {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write layer {index} to {path}: {source}")]
    WriteLayer {
        index: usize,
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("failed to finish archive {path}: {source}")]
    Finish {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Writer for one zip archive of rasterized layers.
pub struct LayerArchive {
    path: PathBuf,
    writer: ZipWriter<File>,
    layers: usize,
}

impl LayerArchive {
    /// Create the archive file. Fails early if the destination is not
    /// writable so the export stage can report the path before any
    /// rasterization work happens.
    pub fn create(path: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| ArchiveError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: ZipWriter::new(file),
            layers: 0,
        })
    }

    /// Append one layer as `layer_NNNN.png`.
    ///
    /// Entries are stored uncompressed: PNG streams are already deflated
    /// and recompressing them buys nothing.
    pub fn push_layer(&mut self, image: &LayerImage) -> ArchiveResult<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let name = format!("layer_{:04}.png", image.index);

        self.writer
            .start_file(name, options)
            .map_err(|source| self.write_error(image.index, source))?;
        self.writer
            .write_all(&image.data)
            .map_err(|source| self.write_error(image.index, ZipError::Io(source)))?;

        self.layers += 1;
        Ok(())
    }

    /// Number of layers written so far.
    pub fn layer_count(&self) -> usize {
        self.layers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the central directory and close the file.
    pub fn finish(self) -> ArchiveResult<PathBuf> {
        let Self { path, writer, .. } = self;
        writer.finish().map_err(|source| ArchiveError::Finish {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn write_error(&self, index: usize, source: ZipError) -> ArchiveError {
        ArchiveError::WriteLayer {
            index,
            path: self.path.clone(),
            source,
        }
    }
}
