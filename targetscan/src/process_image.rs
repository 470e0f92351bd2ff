use std::path::{Path, PathBuf};

use anyhow::Context;
use scan_common::artifacts::ArtifactSink;
use scan_common::color_reducer::{dominant_colors, palette_bar, ColorReport};
use scan_common::config::ScanConfig;
use scan_common::error::open_image;
use scan_common::masking::mask_color_range;
use scan_common::scan::{scan_image, PALETTE_BAR_SIZE};
use scan_common::shapes::detect_shapes_with_artifacts;

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Per-image directory under the configured output directory, so a batch
/// does not overwrite its own artifacts.
fn image_output_dir(path: &Path, config: &ScanConfig) -> PathBuf {
    config.artifacts.output_dir.join(file_stem(path))
}

fn sink_for(path: &Path, config: &ScanConfig) -> anyhow::Result<ArtifactSink> {
    let mut artifacts = config.artifacts.clone();
    artifacts.output_dir = image_output_dir(path, config);
    Ok(ArtifactSink::new(&artifacts)?)
}

fn describe(report: &ColorReport) -> String {
    format!(
        "the color of alphanumeric is {}, the color of the shape is {}",
        report.alphanumeric, report.shape
    )
}

/// Full target scan of one image; prints a line per blob and writes `scan.json`.
pub fn segment(path: &Path, config: &ScanConfig) -> anyhow::Result<()> {
    let image = open_image(path)?.to_rgb8();
    let sink = sink_for(path, config)?;
    let meta = scan_image(&image, path, config, &sink)?;

    println!("\nTargets in {path:?}:");
    if meta.blobs.is_empty() {
        println!("  none");
    }
    for blob in &meta.blobs {
        let b = &blob.bbox;
        let colors = match (&blob.colors, &blob.color_error) {
            (Some(analysis), _) => describe(&analysis.report),
            (None, Some(e)) => format!("color analysis failed: {e}"),
            (None, None) => "no colors".to_string(),
        };
        println!(
            "  #{} at ({}, {}) {}x{}: {colors}",
            blob.index, b.x, b.y, b.width, b.height
        );
    }

    let report_dir = image_output_dir(path, config);
    std::fs::create_dir_all(&report_dir)
        .with_context(|| format!("creating {report_dir:?}"))?;
    let report_path = report_dir.join("scan.json");
    let report_file = std::fs::File::create(&report_path)
        .with_context(|| format!("creating {report_path:?}"))?;
    serde_json::to_writer_pretty(report_file, &meta)?;
    log::info!("Scan report saved to {report_path:?}");
    Ok(())
}

/// Color report of the whole image.
pub fn colors(path: &Path, config: &ScanConfig) -> anyhow::Result<()> {
    let image = open_image(path)?.to_rgb8();
    let analysis = dominant_colors(&image, &config.colors)
        .with_context(|| format!("analysing colors of {path:?}"))?;

    println!("{}: {}", path.display(), describe(&analysis.report));
    for (cluster, name) in analysis.clusters.iter().zip(&analysis.names) {
        println!("  {name:<16} {:5.1}%", cluster.weight * 100.0);
    }

    let (w, h) = PALETTE_BAR_SIZE;
    let bar = palette_bar(&analysis.clusters, w, h);
    sink_for(path, config)?.save_as("colors", "png", &bar)?;
    Ok(())
}

pub fn masked_path(path: &Path) -> PathBuf {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    path.with_extension(format!("masked.{ext}"))
}

/// Writes a copy of the image with the configured color range blacked out.
pub fn mask(path: &Path, config: &ScanConfig) -> anyhow::Result<()> {
    let image = open_image(path)?.to_rgb8();
    let masked = mask_color_range(&image, &config.mask);
    let out = masked_path(path);
    masked
        .save(&out)
        .with_context(|| format!("saving {out:?}"))?;
    log::info!("Masked image saved to {out:?}");
    Ok(())
}

/// Names the dark outline shapes of one image and writes the filled `shapes` image.
pub fn shapes(path: &Path, config: &ScanConfig) -> anyhow::Result<()> {
    let image = open_image(path)?.to_rgb8();
    let sink = sink_for(path, config)?;
    let shapes = detect_shapes_with_artifacts(&image, &config.shapes, &sink)?;

    println!("\nShapes in {path:?}:");
    if shapes.is_empty() {
        println!("  none");
    }
    for shape in &shapes {
        let kind = shape
            .kind
            .map_or_else(|| "unknown".to_string(), |k| k.to_string());
        println!(
            "  #{} {kind} ({} vertices) at ({}, {})",
            shape.index, shape.vertices, shape.bbox.x, shape.bbox.y
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn config_in(dir: &Path) -> ScanConfig {
        let mut config = ScanConfig::default();
        config.artifacts.output_dir = dir.join("procima");
        config.artifacts.extension = "png".to_string();
        config
    }

    fn write_field(dir: &Path) -> PathBuf {
        let mut image = RgbImage::from_pixel(120, 120, Rgb([30, 90, 30]));
        for y in 40..55 {
            for x in 50..65 {
                image.put_pixel(x, y, Rgb([20, 40, 220]));
            }
        }
        let path = dir.join("img1.png");
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn segment_writes_report_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_field(dir.path());
        let config = config_in(dir.path());
        segment(&path, &config).unwrap();

        let out = dir.path().join("procima").join("img1");
        let file = std::fs::File::open(out.join("scan.json")).unwrap();
        let report: serde_json::Value = serde_json::from_reader(file).unwrap();
        assert_eq!(report["blobs"].as_array().unwrap().len(), 1);
        assert_eq!(report["blobs"][0]["colors"]["report"]["shape"], "blue");
        assert!(out.join("final.png").exists());
        assert!(out.join("crop0.png").exists());
    }

    #[test]
    fn report_is_written_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_field(dir.path());
        let mut config = config_in(dir.path());
        config.artifacts.enabled = false;
        segment(&path, &config).unwrap();

        let out = dir.path().join("procima").join("img1");
        assert!(out.join("scan.json").exists());
        assert!(!out.join("final.png").exists());
    }

    #[test]
    fn mask_writes_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.png");
        RgbImage::from_pixel(20, 20, Rgb([20, 220, 20]))
            .save(&path)
            .unwrap();
        mask(&path, &ScanConfig::default()).unwrap();

        let out = image::open(dir.path().join("field.masked.png")).unwrap().to_rgb8();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn masked_path_keeps_extension() {
        assert_eq!(
            masked_path(Path::new("a/img1.jpg")),
            PathBuf::from("a/img1.masked.jpg")
        );
    }

    #[test]
    fn shapes_writes_filled_outline_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = RgbImage::from_pixel(120, 120, Rgb([255, 255, 255]));
        for y in 40..80 {
            for x in 40..80 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let path = dir.path().join("board.png");
        image.save(&path).unwrap();
        shapes(&path, &config_in(dir.path())).unwrap();

        let out = dir.path().join("procima").join("board").join("shapes.png");
        let filled = image::open(out).unwrap().to_rgb8();
        assert_eq!(filled.get_pixel(60, 60).0, [255, 0, 0]);
    }

    #[test]
    fn missing_image_fails() {
        assert!(colors(Path::new("/no/such/img.jpg"), &ScanConfig::default()).is_err());
    }
}
