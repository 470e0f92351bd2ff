//! Wrappers around the external decoders used on drone images: QR codes,
//! single-letter OCR and EXIF GPS tags.

pub mod error;
pub mod gps;
pub mod ocr;
pub mod qr;
pub mod result_log;

pub use error::{Result, ServiceError};
