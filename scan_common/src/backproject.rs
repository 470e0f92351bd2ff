//! Histogram back-projection segmenter.
//!
//! The image's own hue/saturation histogram is projected back onto it, so
//! pixels of common colors (grass, tarmac) score high and rare colors score
//! low. The low scorers are kept, the target material's color range is
//! removed, and a light erosion cleans up what is left.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::morphology::{grayscale_close, grayscale_erode, Mask};
use ndarray::Array2;

use crate::artifacts::ArtifactSink;
use crate::config::SegmenterConfig;
use crate::error::{Result, ScanError};
use crate::hsv::{self, HsvImage, HUE_BINS};

pub const SAT_BINS: usize = 256;

/// Pixel counts indexed by `[hue, saturation]`.
pub fn hue_sat_histogram(hsv: &HsvImage) -> Array2<u32> {
    let mut hist = Array2::<u32>::zeros((HUE_BINS, SAT_BINS));
    for px in hsv.pixels() {
        let [h, s, _] = px.0;
        hist[[usize::from(h).min(HUE_BINS - 1), usize::from(s)]] += 1;
    }
    hist
}

/// Replaces every pixel with its histogram bin count, saturated to 255.
pub fn back_project(hsv: &HsvImage, hist: &Array2<u32>) -> GrayImage {
    let mut out = GrayImage::new(hsv.width(), hsv.height());
    for (src, dst) in hsv.pixels().zip(out.pixels_mut()) {
        let [h, s, _] = src.0;
        let count = hist[[usize::from(h).min(HUE_BINS - 1), usize::from(s)]];
        *dst = Luma([count.min(255) as u8]);
    }
    out
}

/// Otsu level, then inverted: pixels at or below the level become 255.
pub fn otsu_inverse(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    log::debug!("Otsu level of back-projection: {level}");
    let mut binary = image.clone();
    for p in binary.pixels_mut() {
        *p = Luma([if p.0[0] > level { 0 } else { 255 }]);
    }
    binary
}

/// Zeroes pixels of `image` wherever `mask` is zero.
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut out = image.clone();
    for (px, m) in out.pixels_mut().zip(mask.pixels()) {
        if m.0[0] == 0 {
            *px = Rgb([0, 0, 0]);
        }
    }
    out
}

/// Applies a grayscale morphology operator to each channel independently.
pub fn per_channel(image: &RgbImage, op: impl Fn(&GrayImage) -> GrayImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let channels: Vec<GrayImage> = (0..3)
        .map(|c| {
            let plane = GrayImage::from_fn(w, h, |x, y| Luma([image.get_pixel(x, y).0[c]]));
            op(&plane)
        })
        .collect();
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y).0[0],
            channels[1].get_pixel(x, y).0[0],
            channels[2].get_pixel(x, y).0[0],
        ])
    })
}

/// The two images the segmenter produces.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Back-projection result with the target color range removed.
    pub composite: RgbImage,
    /// `composite` after erosion, handed to blob extraction.
    pub segmented: RgbImage,
}

pub fn segment(image: &RgbImage, config: &SegmenterConfig) -> Result<Segmentation> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::Numeric("cannot segment an empty image".to_string()));
    }

    let hsv = hsv::rgb_to_hsv(image);
    let hist = hue_sat_histogram(&hsv);
    let likelihood = back_project(&hsv, &hist);

    let closed = grayscale_close(&likelihood, &Mask::diamond(config.close_radius));
    let keep = otsu_inverse(&closed);
    let rare = apply_mask(image, &keep);

    let mut outside_target = hsv::in_range(&hsv, &config.target_range);
    image::imageops::invert(&mut outside_target);
    let composite = apply_mask(&rare, &outside_target);

    let segmented = if config.erode_radius > 0 {
        let kernel = Mask::diamond(config.erode_radius);
        per_channel(&composite, |plane| grayscale_erode(plane, &kernel))
    } else {
        composite.clone()
    };

    Ok(Segmentation {
        composite,
        segmented,
    })
}

/// Runs [`segment`] and writes `final` and `bckP` artifacts.
pub fn segment_with_artifacts(
    image: &RgbImage,
    config: &SegmenterConfig,
    sink: &ArtifactSink,
) -> Result<Segmentation> {
    let segmentation = segment(image, config)?;
    sink.save("final", &segmentation.composite)?;
    sink.save("bckP", &segmentation.segmented)?;
    Ok(segmentation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HsvRange;

    fn field_with_patch() -> RgbImage {
        // Dark green field with a small blue square.
        let mut image = RgbImage::from_pixel(60, 60, Rgb([30, 90, 30]));
        for y in 20..32 {
            for x in 24..36 {
                image.put_pixel(x, y, Rgb([20, 40, 220]));
            }
        }
        image
    }

    #[test]
    fn histogram_counts_every_pixel() {
        let hsv = hsv::rgb_to_hsv(&field_with_patch());
        let hist = hue_sat_histogram(&hsv);
        assert_eq!(hist.shape(), &[180, 256]);
        assert_eq!(hist.sum(), 60 * 60);
    }

    #[test]
    fn back_projection_saturates_common_colors() {
        let hsv = hsv::rgb_to_hsv(&field_with_patch());
        let projected = back_project(&hsv, &hue_sat_histogram(&hsv));
        assert_eq!(projected.get_pixel(0, 0).0[0], 255);
        assert_eq!(projected.get_pixel(30, 25).0[0], 144);
    }

    #[test]
    fn otsu_inverse_keeps_low_values() {
        let mut image = GrayImage::from_pixel(10, 10, Luma([250]));
        for x in 0..3 {
            image.put_pixel(x, 0, Luma([10]));
        }
        let binary = otsu_inverse(&image);
        assert_eq!(binary.get_pixel(0, 0).0[0], 255);
        assert_eq!(binary.get_pixel(9, 9).0[0], 0);
    }

    #[test]
    fn rare_patch_survives_and_field_is_removed() {
        let config = SegmenterConfig::default();
        let out = segment(&field_with_patch(), &config).unwrap();
        assert_eq!(out.segmented.get_pixel(2, 2), &Rgb([0, 0, 0]));
        assert_eq!(out.composite.get_pixel(30, 26), &Rgb([20, 40, 220]));
        assert_eq!(out.segmented.get_pixel(30, 26), &Rgb([20, 40, 220]));
    }

    #[test]
    fn target_range_is_cut_out() {
        let mut config = SegmenterConfig::default();
        // Cover the patch's blue hue.
        config.target_range = HsvRange::new([110, 0, 0], [130, 255, 255]);
        let out = segment(&field_with_patch(), &config).unwrap();
        assert!(out.composite.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn erosion_shrinks_patch_edges() {
        let out = segment(&field_with_patch(), &SegmenterConfig::default()).unwrap();
        assert_eq!(out.composite.get_pixel(24, 25), &Rgb([20, 40, 220]));
        assert_eq!(out.segmented.get_pixel(24, 25), &Rgb([0, 0, 0]));
    }

    #[test]
    fn empty_image_is_rejected() {
        let err = segment(&RgbImage::new(0, 0), &SegmenterConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::Numeric(_)));
    }
}
