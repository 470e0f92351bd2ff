//! Error type shared by every stage of the scan pipeline.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Input or artifact file could not be read or written.
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Decoding or encoding through the `image` crate failed.
    #[error("image error on {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The input is empty where the algorithm needs data to work with.
    #[error("numeric error: {0}")]
    Numeric(String),
    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
    #[error("invalid configuration in {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ScanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;

/// Opens an image from disk, separating "cannot read the file" from
/// "the bytes are not an image" so callers can report either.
pub fn open_image(path: &std::path::Path) -> Result<image::DynamicImage> {
    let reader = image::ImageReader::open(path).map_err(|e| ScanError::io(path, e))?;
    let reader = reader
        .with_guessed_format()
        .map_err(|e| ScanError::io(path, e))?;
    reader.decode().map_err(|e| ScanError::image(path, e))
}
