//! Append-only text logs of decoded results.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ServiceError};

pub const DEFAULT_QR_LOG: &str = "workfile.csv";
pub const DEFAULT_OCR_LOG: &str = "tesseractDump.txt";

fn append(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ServiceError::io(path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| ServiceError::io(path, e))
}

/// Appends a `QR,<text>` line.
pub fn append_qr_log(path: &Path, text: &str) -> Result<()> {
    append(path, &format!("QR,{text}\n"))
}

/// Appends `\n Letter is <letter>`; the newline leads the record.
pub fn append_ocr_log(path: &Path, letter: &str) -> Result<()> {
    append(path, &format!("\n Letter is {letter}"))
}
