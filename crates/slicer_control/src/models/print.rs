//! Geometry collaborator capabilities.
//!
//! The slicing algorithms themselves live in the geometry backend; the
//! control layer only drives them through these traits and routes their
//! failures into issue reports.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::export::PngExportConfig;

use super::layer::LayerImage;

/// Error from a geometry backend operation.
#[derive(Error, Debug)]
pub enum PrintError {
    /// A stage operation failed for a recoverable reason.
    #[error("{0}")]
    Stage(String),

    /// The print state is corrupt; the job cannot continue.
    #[error("unrecoverable: {0}")]
    Fatal(String),

    /// File I/O failed inside the backend.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl PrintError {
    pub fn stage(message: impl Into<String>) -> Self {
        Self::Stage(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Whether this failure makes the whole job irrecoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Result type for geometry backend operations.
pub type PrintResult<T> = Result<T, PrintError>;

/// One printable object inside a print. Opaque beyond its name.
pub trait PrintObject: Send + Sync {
    fn name(&self) -> String;
}

/// The loaded model scene. The control layer only stores it on behalf of
/// the host application.
pub trait Model: Send + Sync {
    fn name(&self) -> String;
}

/// A print job's geometry backend.
///
/// The per-object operations receive the object to work on; objects are
/// always iterated in the order [`objects`](Self::objects) returns them
/// (insertion order), which is significant for reproducibility of the
/// generated geometry.
pub trait Print: Send + Sync {
    fn name(&self) -> String;

    /// The job's objects, in insertion order.
    fn objects(&self) -> Vec<Arc<dyn PrintObject>>;

    fn make_skirt(&self) -> PrintResult<()>;

    fn make_brim(&self) -> PrintResult<()>;

    fn make_wipe_tower(&self) -> PrintResult<()>;

    fn make_perimeters(&self, object: &dyn PrintObject) -> PrintResult<()>;

    fn infill(&self, object: &dyn PrintObject) -> PrintResult<()>;

    fn generate_support_material(&self, object: &dyn PrintObject) -> PrintResult<()>;

    /// Number of layers the sliced print produces for export.
    fn layer_count(&self) -> usize;

    /// Rasterize one layer to an encoded image. Encoding happens in the
    /// backend; the control layer treats the bytes as opaque.
    fn rasterize_layer(&self, index: usize, config: &PngExportConfig) -> PrintResult<LayerImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_constructors_carry_context() {
        let err = PrintError::stage("no contour at z=0.3");
        assert_eq!(err.to_string(), "no contour at z=0.3");
        assert!(!err.is_fatal());

        let err = PrintError::fatal("mesh is not manifold");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("unrecoverable"));

        let err = PrintError::io(
            "reading mesh",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("reading mesh"));
    }
}
