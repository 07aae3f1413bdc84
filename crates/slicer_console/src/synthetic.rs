//! Synthetic geometry backend for dry runs.
//!
//! Stands in for the real slicing engine so the control layer can be
//! exercised end to end from the command line: every operation succeeds
//! instantly (with optional injected failures) and "rasterized" layers
//! are placeholder byte blobs, not real images.

use std::sync::Arc;

use parking_lot::Mutex;

use slicer_control::export::PngExportConfig;
use slicer_control::models::{LayerImage, Print, PrintError, PrintObject, PrintResult};

pub struct SyntheticObject {
    name: String,
}

impl PrintObject for SyntheticObject {
    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Dry-run print: N named objects, M layers, optional failure injection.
pub struct SyntheticPrint {
    name: String,
    objects: Vec<Arc<dyn PrintObject>>,
    layers: usize,
    fail_perimeters_for: Option<String>,
    ops: Mutex<Vec<String>>,
}

impl SyntheticPrint {
    pub fn new(name: impl Into<String>, object_count: usize, layers: usize) -> Self {
        let objects = (0..object_count)
            .map(|i| {
                Arc::new(SyntheticObject {
                    name: format!("object_{}", i),
                }) as Arc<dyn PrintObject>
            })
            .collect();
        Self {
            name: name.into(),
            objects,
            layers,
            fail_perimeters_for: None,
            ops: Mutex::new(Vec::new()),
        }
    }

    /// Make the perimeter stage fail for the given object index.
    pub fn fail_perimeters_for(mut self, index: usize) -> Self {
        self.fail_perimeters_for = Some(format!("object_{}", index));
        self
    }

    /// Operations performed so far, in order.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }

    fn record(&self, op: String) {
        self.ops.lock().push(op);
    }
}

impl Print for SyntheticPrint {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn objects(&self) -> Vec<Arc<dyn PrintObject>> {
        self.objects.clone()
    }

    fn make_skirt(&self) -> PrintResult<()> {
        self.record("skirt".to_string());
        Ok(())
    }

    fn make_brim(&self) -> PrintResult<()> {
        self.record("brim".to_string());
        Ok(())
    }

    fn make_wipe_tower(&self) -> PrintResult<()> {
        self.record("wipe_tower".to_string());
        Ok(())
    }

    fn make_perimeters(&self, object: &dyn PrintObject) -> PrintResult<()> {
        self.record(format!("perimeters:{}", object.name()));
        if self.fail_perimeters_for.as_deref() == Some(object.name().as_str()) {
            return Err(PrintError::stage("injected perimeter failure"));
        }
        Ok(())
    }

    fn infill(&self, object: &dyn PrintObject) -> PrintResult<()> {
        self.record(format!("infill:{}", object.name()));
        Ok(())
    }

    fn generate_support_material(&self, object: &dyn PrintObject) -> PrintResult<()> {
        self.record(format!("support:{}", object.name()));
        Ok(())
    }

    fn layer_count(&self) -> usize {
        self.layers
    }

    fn rasterize_layer(&self, index: usize, config: &PngExportConfig) -> PrintResult<LayerImage> {
        // Placeholder bytes; real rasterization lives in the geometry
        // backend.
        let data = format!(
            "dry-run layer {} ({}x{} px)",
            index, config.width_px, config.height_px
        )
        .into_bytes();
        Ok(LayerImage::new(index, config.width_px, config.height_px, data))
    }
}
