//! Removal of a single color range from an image.

use image::RgbImage;
use imageproc::filter::median_filter;

use crate::backproject::apply_mask;
use crate::config::MaskConfig;
use crate::hsv;

/// Zeroes every pixel whose median-smoothed HSV value falls inside `config.range`.
pub fn mask_color_range(image: &RgbImage, config: &MaskConfig) -> RgbImage {
    let hsv = hsv::rgb_to_hsv(image);
    let smoothed = if config.median_radius > 0 {
        median_filter(&hsv, config.median_radius, config.median_radius)
    } else {
        hsv
    };
    let mut keep = hsv::in_range(&smoothed, &config.range);
    image::imageops::invert(&mut keep);
    apply_mask(image, &keep)
}
