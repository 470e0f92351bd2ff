//! Single-character recognition through the system `tesseract` binary.

use std::collections::HashMap;
use std::path::Path;

use image::DynamicImage;
use rusty_tesseract::{Args, Image};

use crate::error::{open_image, Result, ServiceError};

/// Reported when tesseract recognizes nothing.
pub const NO_LETTER: &str = "NA";

pub const CHAR_WHITELIST: &str = "!@#$%^&*()<>?/{}[]+=_-,.;:~`\
0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Page segmentation mode "treat the image as a single character".
pub const PSM_SINGLE_CHAR: i32 = 10;

pub fn letter_args() -> Args {
    let mut config_variables = HashMap::new();
    config_variables.insert(
        "tessedit_char_whitelist".to_string(),
        CHAR_WHITELIST.to_string(),
    );
    Args {
        lang: "eng".to_string(),
        config_variables,
        dpi: Some(150),
        psm: Some(PSM_SINGLE_CHAR),
        oem: Some(3),
    }
}

pub fn normalize_letter(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NO_LETTER.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn read_letter(image: &DynamicImage) -> Result<String> {
    let tess_img =
        Image::from_dynamic_image(image).map_err(|e| ServiceError::Ocr(e.to_string()))?;
    let raw = rusty_tesseract::image_to_string(&tess_img, &letter_args())
        .map_err(|e| ServiceError::Ocr(e.to_string()))?;
    log::debug!("tesseract raw output {raw:?}");
    Ok(normalize_letter(&raw))
}

pub fn read_letter_file(path: &Path) -> Result<String> {
    let image = open_image(path)?;
    let letter = read_letter(&image)?;
    log::info!("OCR {path:?}: {letter}");
    Ok(letter)
}
