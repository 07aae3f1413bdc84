//! Rasterized layer data as delivered by the geometry backend.

/// One rasterized layer.
///
/// `data` is the finished, already-encoded image byte stream; the control
/// layer never touches the pixel format.
#[derive(Debug, Clone)]
pub struct LayerImage {
    /// Zero-based layer index.
    pub index: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub data: Vec<u8>,
}

impl LayerImage {
    pub fn new(index: usize, width_px: u32, height_px: u32, data: Vec<u8>) -> Self {
        Self {
            index,
            width_px,
            height_px,
            data,
        }
    }
}
