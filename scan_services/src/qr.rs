//! QR code reading with `rqrr`.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use serde::Serialize;

use crate::error::{open_image, Result};

/// Payload some grid markers carry when the drone flies outside the grid.
pub const OUT_OF_GRID_PAYLOAD: &str = "None";
/// Log line written in place of that payload.
pub const OUT_OF_GRID_MESSAGE: &str = "Drone bevindt zich buiten het raster";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum QrOutcome {
    Decoded(String),
    NotFound,
}

impl QrOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            QrOutcome::Decoded(text) => Some(text),
            QrOutcome::NotFound => None,
        }
    }
}

/// Maps the raw payload to the text that is reported.
pub fn interpret_payload(payload: String) -> String {
    if payload == OUT_OF_GRID_PAYLOAD {
        OUT_OF_GRID_MESSAGE.to_string()
    } else {
        payload
    }
}

/// Decodes the first readable grid in the image.
pub fn decode_qr(gray: GrayImage) -> QrOutcome {
    let mut prepared = rqrr::PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();
    log::debug!("{} QR grid candidates", grids.len());

    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => return QrOutcome::Decoded(interpret_payload(content)),
            Err(e) => log::warn!("QR grid found but not decodable: {e}"),
        }
    }
    QrOutcome::NotFound
}

pub fn decode_qr_image(image: &DynamicImage) -> QrOutcome {
    decode_qr(image.to_luma8())
}

pub fn decode_qr_file(path: &Path) -> Result<QrOutcome> {
    let image = open_image(path)?;
    let outcome = decode_qr_image(&image);
    log::info!("QR {path:?}: {outcome:?}");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn out_of_grid_payload_is_replaced() {
        assert_eq!(
            interpret_payload("None".into()),
            "Drone bevindt zich buiten het raster"
        );
        assert_eq!(interpret_payload("None".into()), OUT_OF_GRID_MESSAGE);
        assert_eq!(interpret_payload("B4".into()), "B4");
        assert_eq!(interpret_payload("none".into()), "none");
    }

    #[test]
    fn blank_image_has_no_code() {
        let gray = GrayImage::from_pixel(120, 120, Luma([255]));
        assert_eq!(decode_qr(gray), QrOutcome::NotFound);
        assert_eq!(QrOutcome::NotFound.text(), None);
    }

    #[test]
    fn outcome_serializes_with_status() {
        let json = serde_json::to_value(QrOutcome::Decoded("A1".into())).unwrap();
        assert_eq!(json["status"], "decoded");
        assert_eq!(json["text"], "A1");
    }
}
