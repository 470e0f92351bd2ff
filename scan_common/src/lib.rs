//! Target detection in aerial images: back-projection segmentation, blob
//! extraction, color naming and outline shape classification.

pub mod artifacts;
pub mod backproject;
pub mod blobs;
pub mod color_names;
pub mod color_reducer;
pub mod config;
pub mod error;
pub mod hsv;
pub mod masking;
pub mod scan;
pub mod scan_meta;
pub mod shapes;

pub use error::{Result, ScanError};
