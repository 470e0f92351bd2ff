//! Blob extraction from a segmented frame.
//!
//! Every border the contour tracer finds is a candidate, outer borders and
//! hole borders alike. A candidate is kept when its enclosed area is inside
//! `(min_area, max_area]` and its minimum-area rectangle is not elongated.

use std::path::PathBuf;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactSink;
use crate::config::{BlobConfig, BlobOrder};
use crate::error::Result;
use crate::hsv;

const OVERLAY: Rgb<u8> = Rgb([0, 255, 0]);

/// Axis-aligned box in pixel coordinates, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn of_points(points: &[Point<i32>]) -> Option<Self> {
        let min_x = points.iter().map(|p| p.x).min()?;
        let max_x = points.iter().map(|p| p.x).max()?;
        let min_y = points.iter().map(|p| p.y).min()?;
        let max_y = points.iter().map(|p| p.y).max()?;
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Blob {
    /// Position in the accepted sequence, also the crop file number.
    pub index: usize,
    pub bbox: BoundingBox,
    /// Side lengths of the minimum-area rectangle.
    pub rect_width: f64,
    pub rect_height: f64,
    /// Area enclosed by the contour.
    pub area: f64,
    pub hole: bool,
    pub crop: RgbImage,
    pub crop_path: Option<PathBuf>,
}

impl Blob {
    pub fn aspect(&self) -> f64 {
        self.rect_width / self.rect_height
    }
}

/// Area enclosed by a closed polygon (shoelace formula).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}

/// Side lengths of a rectangle given by its four corners in order.
pub fn rect_sides(corners: &[Point<i32>; 4]) -> (f64, f64) {
    let side = |a: Point<i32>, b: Point<i32>| {
        f64::from(a.x - b.x).hypot(f64::from(a.y - b.y))
    };
    (side(corners[0], corners[1]), side(corners[1], corners[2]))
}

pub fn area_in_range(area: f64, config: &BlobConfig) -> bool {
    area > config.min_area && area <= config.max_area
}

/// Both `w/h` and `h/w` must stay within `max_aspect`. Degenerate sides never pass.
pub fn aspect_ok(width: f64, height: f64, config: &BlobConfig) -> bool {
    if width <= 0.0 || height <= 0.0 {
        return false;
    }
    width / height <= config.max_aspect && height / width <= config.max_aspect
}

/// 255 where the BT.601 gray level exceeds `threshold`.
pub fn binarize(image: &RgbImage, threshold: u8) -> GrayImage {
    let mut gray = hsv::luma(image);
    for p in gray.pixels_mut() {
        *p = Luma([if p.0[0] > threshold { 255 } else { 0 }]);
    }
    gray
}

fn draw_contour(canvas: &mut RgbImage, points: &[Point<i32>]) {
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        draw_line_segment_mut(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            OVERLAY,
        );
    }
}

/// Accepted blobs plus the frame with every area-passing contour drawn on it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub blobs: Vec<Blob>,
    pub annotated: RgbImage,
}

pub fn extract_blobs(masked: &RgbImage, config: &BlobConfig) -> Extraction {
    let binary = binarize(masked, config.binary_threshold);
    let contours = find_contours::<i32>(&binary);
    log::debug!("{} contours found", contours.len());

    let mut annotated = masked.clone();
    let mut blobs = Vec::new();

    for contour in &contours {
        let area = contour_area(&contour.points);
        if !area_in_range(area, config) {
            continue;
        }
        let Some(bbox) = BoundingBox::of_points(&contour.points) else {
            continue;
        };

        draw_contour(&mut annotated, &contour.points);
        draw_hollow_rect_mut(
            &mut annotated,
            Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height),
            OVERLAY,
        );
        log::debug!("w={} h={}", bbox.width, bbox.height);

        let (rect_width, rect_height) = rect_sides(&min_area_rect(&contour.points));
        if !aspect_ok(rect_width, rect_height, config) {
            continue;
        }

        let crop =
            image::imageops::crop_imm(masked, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
        blobs.push(Blob {
            index: 0,
            bbox,
            rect_width,
            rect_height,
            area,
            hole: matches!(contour.border_type, BorderType::Hole),
            crop,
            crop_path: None,
        });
    }

    if config.order == BlobOrder::TopLeft {
        blobs.sort_by_key(|b| (b.bbox.y, b.bbox.x));
    }
    for (index, blob) in blobs.iter_mut().enumerate() {
        blob.index = index;
    }

    Extraction { blobs, annotated }
}

/// Runs [`extract_blobs`], writes `crop<N>` per blob and the `annotated` frame.
pub fn extract_blobs_with_artifacts(
    masked: &RgbImage,
    config: &BlobConfig,
    sink: &ArtifactSink,
) -> Result<Vec<Blob>> {
    let Extraction {
        mut blobs,
        annotated,
    } = extract_blobs(masked, config);
    for blob in &mut blobs {
        blob.crop_path = sink.save(&format!("crop{}", blob.index), &blob.crop)?;
    }
    sink.save("annotated", &annotated)?;
    log::info!("{} blobs accepted", blobs.len());
    Ok(blobs)
}
