//! Outline shapes of dark figures on a light background.
//!
//! The gray image is eroded and inverse-thresholded, every traced border is
//! simplified with Douglas-Peucker, and the number of remaining vertices
//! names the shape.

use std::fmt;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::{grayscale_erode, Mask};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactSink;
use crate::blobs::BoundingBox;
use crate::config::ShapeConfig;
use crate::error::Result;
use crate::hsv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Triangle,
    Square,
    Pentagon,
    HalfCircle,
    Star,
    Circle,
}

impl ShapeKind {
    pub fn from_vertex_count(vertices: usize) -> Option<Self> {
        match vertices {
            3 => Some(Self::Triangle),
            4 => Some(Self::Square),
            5 => Some(Self::Pentagon),
            9 => Some(Self::HalfCircle),
            11 => Some(Self::Star),
            n if n > 15 => Some(Self::Circle),
            _ => None,
        }
    }

    /// Fill used on the annotated frame. Stars stay unfilled.
    fn fill(self) -> Option<Rgb<u8>> {
        match self {
            Self::Triangle => Some(Rgb([0, 255, 0])),
            Self::Square => Some(Rgb([255, 0, 0])),
            Self::Pentagon => Some(Rgb([0, 0, 255])),
            Self::HalfCircle => Some(Rgb([0, 255, 255])),
            Self::Circle => Some(Rgb([255, 255, 0])),
            Self::Star => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Pentagon => "pentagon",
            Self::HalfCircle => "half-circle",
            Self::Star => "star",
            Self::Circle => "circle",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub index: usize,
    /// `None` when the vertex count matches no known shape.
    pub kind: Option<ShapeKind>,
    pub vertices: usize,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone)]
pub struct ShapeDetection {
    pub shapes: Vec<Shape>,
    pub annotated: RgbImage,
}

/// 255 where the eroded gray level is at or below `config.threshold`.
pub fn foreground(image: &RgbImage, config: &ShapeConfig) -> GrayImage {
    let gray = hsv::luma(image);
    let mut binary = if config.erode_radius > 0 {
        grayscale_erode(&gray, &Mask::square(config.erode_radius))
    } else {
        gray
    };
    for p in binary.pixels_mut() {
        *p = Luma([if p.0[0] > config.threshold { 0 } else { 255 }]);
    }
    binary
}

fn dist2(a: Point<i32>, b: Point<i32>) -> i64 {
    let dx = i64::from(a.x - b.x);
    let dy = i64::from(a.y - b.y);
    dx * dx + dy * dy
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The ring is cut at two mutually distant points, which are always kept, and
/// each half is simplified on its own. The result does not repeat its first
/// point.
pub fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let farthest_from = |from: Point<i32>| {
        points
            .iter()
            .enumerate()
            .max_by_key(|(_, p)| dist2(from, **p))
            .map_or(0, |(i, _)| i)
    };
    let start = farthest_from(points[0]);
    let opposite = farthest_from(points[start]);

    let n = points.len();
    let ring: Vec<Point<i32>> = (0..n).map(|i| points[(start + i) % n]).collect();
    let split = (opposite + n - start) % n;
    if split == 0 {
        return vec![ring[0]];
    }

    let epsilon = epsilon.max(f64::EPSILON);
    let mut vertices = approximate_polygon_dp(&ring[..=split], epsilon, false);
    let mut back: Vec<Point<i32>> = ring[split..].to_vec();
    back.push(ring[0]);
    // Both halves share the cut points.
    vertices.pop();
    vertices.extend(approximate_polygon_dp(&back, epsilon, false));
    vertices.pop();
    vertices
}

pub fn detect_shapes(image: &RgbImage, config: &ShapeConfig) -> ShapeDetection {
    let binary = foreground(image, config);
    let contours = find_contours::<i32>(&binary);
    log::debug!("{} contours found", contours.len());

    let mut annotated = image.clone();
    let mut shapes = Vec::new();
    for contour in &contours {
        let Some(bbox) = BoundingBox::of_points(&contour.points) else {
            continue;
        };
        let epsilon = config.epsilon_factor * arc_length(&contour.points, true);
        let polygon = approximate_closed(&contour.points, epsilon);
        let kind = ShapeKind::from_vertex_count(polygon.len());
        log::debug!("{} vertices -> {kind:?}", polygon.len());

        if let Some(color) = kind.and_then(ShapeKind::fill) {
            if polygon.len() >= 3 && polygon.first() != polygon.last() {
                draw_polygon_mut(&mut annotated, &polygon, color);
            }
        }
        shapes.push(Shape {
            index: shapes.len(),
            kind,
            vertices: polygon.len(),
            bbox,
        });
    }

    ShapeDetection { shapes, annotated }
}

/// Runs [`detect_shapes`] and writes the `shapes` artifact.
pub fn detect_shapes_with_artifacts(
    image: &RgbImage,
    config: &ShapeConfig,
    sink: &ArtifactSink,
) -> Result<Vec<Shape>> {
    let ShapeDetection { shapes, annotated } = detect_shapes(image, config);
    sink.save("shapes", &annotated)?;
    log::info!("{} shapes traced", shapes.len());
    Ok(shapes)
}
