use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::blobs::{Blob, BoundingBox};
use crate::color_reducer::ColorAnalysis;

/// Metadata of one accepted blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMeta {
    pub index: usize,
    pub bbox: BoundingBox,
    pub rect_width: f64,
    pub rect_height: f64,
    pub aspect: f64,
    pub area: f64,
    pub hole: bool,
    pub crop_file: Option<PathBuf>,
    pub colors: Option<ColorAnalysis>,
    /// Why color analysis failed, when it did.
    pub color_error: Option<String>,
}

impl BlobMeta {
    pub fn new(blob: &Blob) -> Self {
        Self {
            index: blob.index,
            bbox: blob.bbox,
            rect_width: blob.rect_width,
            rect_height: blob.rect_height,
            aspect: blob.aspect(),
            area: blob.area,
            hole: blob.hole,
            crop_file: blob.crop_path.clone(),
            colors: None,
            color_error: None,
        }
    }
}

/// Metadata corresponding to a scanned image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMeta {
    /// Path to the original input image.
    pub input_file: PathBuf,
    pub width: u32,
    pub height: u32,
    pub blobs: Vec<BlobMeta>,
}

impl ScanMeta {
    pub fn new(input_file: PathBuf, width: u32, height: u32) -> Self {
        Self {
            input_file,
            width,
            height,
            blobs: Vec::new(),
        }
    }

    pub fn push(&mut self, blob: BlobMeta) {
        self.blobs.push(blob);
    }
}
