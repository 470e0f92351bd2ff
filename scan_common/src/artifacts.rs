//! Where intermediate and final images of a scan are written for inspection.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::config::ArtifactConfig;
use crate::error::{Result, ScanError};

/// Writes pipeline images into one output directory, or nowhere when disabled.
///
/// Runs that share a directory overwrite each other's files, so callers
/// process one image at a time per directory.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: Option<PathBuf>,
    extension: String,
}

impl ArtifactSink {
    pub fn new(config: &ArtifactConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| ScanError::io(&config.output_dir, e))?;
        Ok(Self {
            dir: Some(config.output_dir.clone()),
            extension: config.extension.clone(),
        })
    }

    pub fn disabled() -> Self {
        Self {
            dir: None,
            extension: String::new(),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Saves `image` as `<stem>.<extension>`, returning the written path.
    pub fn save(&self, stem: &str, image: &RgbImage) -> Result<Option<PathBuf>> {
        self.save_as(stem, &self.extension, image)
    }

    pub fn save_as(
        &self,
        stem: &str,
        extension: &str,
        image: &RgbImage,
    ) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let path = dir.join(format!("{stem}.{extension}"));
        image.save(&path).map_err(|e| ScanError::image(&path, e))?;
        log::debug!("Wrote {path:?}");
        Ok(Some(path))
    }
}
