//! The whole pipeline for one image: segment, extract blobs, name their colors.

use std::path::Path;

use image::RgbImage;

use crate::artifacts::ArtifactSink;
use crate::backproject::segment_with_artifacts;
use crate::blobs::extract_blobs_with_artifacts;
use crate::color_reducer::{dominant_colors, palette_bar};
use crate::config::ScanConfig;
use crate::error::{open_image, Result};
use crate::scan_meta::{BlobMeta, ScanMeta};

pub const PALETTE_BAR_SIZE: (u32, u32) = (300, 50);

/// Scans an in-memory image. A color analysis failure only marks its blob.
pub fn scan_image(
    image: &RgbImage,
    input_file: &Path,
    config: &ScanConfig,
    sink: &ArtifactSink,
) -> Result<ScanMeta> {
    let segmentation = segment_with_artifacts(image, &config.segmenter, sink)?;
    let blobs = extract_blobs_with_artifacts(&segmentation.segmented, &config.blobs, sink)?;

    let mut meta = ScanMeta::new(input_file.to_path_buf(), image.width(), image.height());
    for blob in &blobs {
        let mut blob_meta = BlobMeta::new(blob);
        match dominant_colors(&blob.crop, &config.colors) {
            Ok(analysis) => {
                let (w, h) = PALETTE_BAR_SIZE;
                sink.save_as(
                    &format!("colors{}", blob.index),
                    "png",
                    &palette_bar(&analysis.clusters, w, h),
                )?;
                blob_meta.colors = Some(analysis);
            }
            Err(e) => {
                log::warn!("Color analysis of blob {} failed: {e}", blob.index);
                blob_meta.color_error = Some(e.to_string());
            }
        }
        meta.push(blob_meta);
    }
    Ok(meta)
}

/// Reads `path` and scans it.
pub fn scan_file(path: &Path, config: &ScanConfig, sink: &ArtifactSink) -> Result<ScanMeta> {
    let image = open_image(path)?.to_rgb8();
    log::info!("Scanning {path:?} ({}x{})", image.width(), image.height());
    scan_image(&image, path, config, sink)
}
