//! 8-bit RGB to HSV and gray conversions.
//!
//! Hue is stored halved so it fits a byte: `[0, 180)`. Saturation and value
//! span `[0, 255]`. This is the layout the HSV ranges in the config are
//! written against.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::config::HsvRange;

/// An `RgbImage` whose channels hold H, S and V.
pub type HsvImage = RgbImage;

pub const HUE_BINS: usize = 180;

pub fn rgb_to_hsv_pixel([r, g, b]: [u8; 3]) -> [u8; 3] {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = f32::from(v - min);

    let s = if v == 0 {
        0
    } else {
        (255.0 * diff / f32::from(v)).round() as u8
    };

    if diff == 0.0 {
        return [0, s, v];
    }

    let red_max = v == r;
    let green_max = v == g;
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    // Hue in sixths of a turn.
    let sextant = if red_max {
        (g - b) / diff
    } else if green_max {
        2.0 + (b - r) / diff
    } else {
        4.0 + (r - g) / diff
    };

    let mut h = (sextant * 30.0).round() as i32;
    if h < 0 {
        h += HUE_BINS as i32;
    }
    if h >= HUE_BINS as i32 {
        h -= HUE_BINS as i32;
    }

    [h as u8, s, v]
}

pub fn rgb_to_hsv(image: &RgbImage) -> HsvImage {
    let mut out = HsvImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        *dst = Rgb(rgb_to_hsv_pixel(src.0));
    }
    out
}

/// 255 where the pixel lies inside `range`, 0 elsewhere.
pub fn in_range(hsv: &HsvImage, range: &HsvRange) -> GrayImage {
    let mut mask = GrayImage::new(hsv.width(), hsv.height());
    for (src, dst) in hsv.pixels().zip(mask.pixels_mut()) {
        *dst = Luma([if range.contains(src.0) { 255 } else { 0 }]);
    }
    mask
}

/// BT.601 luma (0.299, 0.587, 0.114) in 14-bit fixed point, rounded.
pub fn luma_pixel([r, g, b]: [u8; 3]) -> u8 {
    let weighted = u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868;
    ((weighted + (1 << 13)) >> 14) as u8
}

pub fn luma(image: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        *dst = Luma([luma_pixel(src.0)]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_rounds_dark_colors_up() {
        assert_eq!(luma_pixel([0, 0, 13]), 1);
        assert_eq!(luma_pixel([0, 0, 4]), 0);
        assert_eq!(luma_pixel([255, 255, 255]), 255);
        assert_eq!(luma_pixel([255, 0, 0]), 76);
        assert_eq!(luma_pixel([0, 255, 0]), 150);
        assert_eq!(luma_pixel([0, 0, 255]), 29);
    }

    #[test]
    fn primaries() {
        assert_eq!(rgb_to_hsv_pixel([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv_pixel([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv_pixel([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv_pixel([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv_pixel([128, 128, 128]), [0, 0, 128]);
        assert_eq!(rgb_to_hsv_pixel([255, 255, 255]), [0, 0, 255]);
    }

    #[test]
    fn magenta_wraps_below_180() {
        let [h, s, v] = rgb_to_hsv_pixel([255, 0, 255]);
        assert_eq!((h, s, v), (150, 255, 255));
        assert_eq!(rgb_to_hsv_pixel([255, 0, 20])[0], 178);
        assert_eq!(rgb_to_hsv_pixel([255, 0, 1])[0], 0);
    }

    #[test]
    fn orange_lands_in_target_range() {
        let hsv = rgb_to_hsv_pixel([200, 120, 40]);
        assert!(HsvRange::new([5, 90, 50], [49, 255, 205]).contains(hsv));
    }

    #[test]
    fn in_range_marks_matching_pixels() {
        let mut image = RgbImage::from_pixel(4, 1, Rgb([0, 0, 255]));
        image.put_pixel(2, 0, Rgb([0, 255, 0]));
        let mask = in_range(&rgb_to_hsv(&image), &HsvRange::new([50, 100, 100], [70, 255, 255]));
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 0]);
    }
}
