use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image error on {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The EXIF block exists but could not be parsed.
    #[error("exif error on {path:?}: {source}")]
    Exif {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },
    #[error("tesseract failed: {0}")]
    Ocr(String),
}

impl ServiceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

pub(crate) fn open_image(path: &Path) -> Result<image::DynamicImage> {
    let reader = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ServiceError::io(path, e))?;
    reader.decode().map_err(|source| ServiceError::Image {
        path: path.to_path_buf(),
        source,
    })
}
