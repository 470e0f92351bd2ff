//! Tunable constants of the scan pipeline.
//!
//! The defaults suit nadir shots of colored targets on grass. Every value can
//! be overridden from a JSON file, missing keys fall back to the defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Inclusive HSV bounds, hue in `[0, 180)`, saturation and value in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Color range of the target material, removed from the back-projection result.
    pub target_range: HsvRange,
    /// Radius of the diamond kernel used to close the likelihood map (1 = 3x3).
    pub close_radius: u8,
    /// Radius of the diamond kernel of the final erosion, 0 disables it.
    pub erode_radius: u8,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            target_range: HsvRange::new([5, 90, 50], [49, 255, 205]),
            close_radius: 1,
            erode_radius: 1,
        }
    }
}

/// Order in which accepted blobs are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobOrder {
    /// Whatever order the contour tracer discovers borders in.
    #[default]
    Discovery,
    /// Sorted by the top-left corner of the bounding box, row first.
    TopLeft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Gray level a pixel must exceed to count as foreground.
    pub binary_threshold: u8,
    /// Exclusive lower bound on contour area.
    pub min_area: f64,
    /// Inclusive upper bound on contour area.
    pub max_area: f64,
    /// Largest accepted side ratio of the minimum-area rectangle, either way round.
    pub max_aspect: f64,
    pub order: BlobOrder,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 0,
            min_area: 100.0,
            max_area: 10_000.0,
            max_aspect: 4.0 / 2.5,
            order: BlobOrder::Discovery,
        }
    }
}

/// Which end of the weight-sorted bucket list the two reported colors are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrder {
    /// Lightest buckets first, so the two lightest buckets are reported.
    #[default]
    Ascending,
    /// Heaviest buckets first.
    Descending,
}

impl FromStr for ReportOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            other => Err(format!(
                "unknown report order {other:?}, expected ascending or descending"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub clusters: usize,
    pub max_iterations: usize,
    pub convergence: f32,
    pub seed: u64,
    pub report_order: ReportOrder,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            clusters: 5,
            max_iterations: 20,
            convergence: 1e-4,
            seed: 0,
            report_order: ReportOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    /// File extension, which also selects the encoder.
    pub extension: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("procima"),
            extension: "jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub range: HsvRange,
    /// Median filter radius applied to the HSV copy before ranging (2 = 5x5).
    pub median_radius: u32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            range: HsvRange::new([50, 100, 100], [70, 255, 255]),
            median_radius: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Radius of the square erosion kernel applied to the gray image (2 = 5x5).
    pub erode_radius: u8,
    /// Gray levels at or below this are foreground.
    pub threshold: u8,
    /// Polygon approximation tolerance as a fraction of the contour length.
    pub epsilon_factor: f64,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            erode_radius: 2,
            threshold: 127,
            epsilon_factor: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub segmenter: SegmenterConfig,
    pub blobs: BlobConfig,
    pub colors: ColorConfig,
    pub artifacts: ArtifactConfig,
    pub mask: MaskConfig,
    pub shapes: ShapeConfig,
}

impl ScanConfig {
    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| ScanError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                log::info!("Loading scan config from {path:?}");
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}
