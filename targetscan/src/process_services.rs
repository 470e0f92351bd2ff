use std::path::Path;

use anyhow::Context;
use scan_services::gps::read_gps;
use scan_services::ocr::read_letter_file;
use scan_services::qr::{decode_qr_file, QrOutcome};
use scan_services::result_log::{append_ocr_log, append_qr_log};

/// Decodes a QR code and appends it to `log_path`. An image without a code
/// is reported but not logged.
pub fn qr(path: &Path, log_path: &Path) -> anyhow::Result<()> {
    match decode_qr_file(path)? {
        QrOutcome::Decoded(text) => {
            println!("{}: {text}", path.display());
            append_qr_log(log_path, &text)
                .with_context(|| format!("writing QR log {log_path:?}"))?;
        }
        QrOutcome::NotFound => println!("{}: no QR code found", path.display()),
    }
    Ok(())
}

pub fn ocr(path: &Path, log_path: &Path) -> anyhow::Result<()> {
    let letter = read_letter_file(path)?;
    println!("{}: Letter is {letter}", path.display());
    append_ocr_log(log_path, &letter)
        .with_context(|| format!("writing OCR log {log_path:?}"))?;
    Ok(())
}

pub fn gps(path: &Path) -> anyhow::Result<()> {
    let fix = read_gps(path)?;
    println!("{}", serde_json::to_string(&fix)?);
    Ok(())
}
