mod process_image;
mod process_services;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use scan_common::config::{ReportOrder, ScanConfig};
use scan_services::result_log::{DEFAULT_OCR_LOG, DEFAULT_QR_LOG};
use tracing_subscriber::prelude::*;

/// Finds ground targets in drone images and reads their markings.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// JSON scan configuration. Sections left out keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for debug images and `scan.json` reports.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Skip writing debug images.
    #[arg(long, action, global = true, default_value = "false")]
    no_artifacts: bool,
    /// Which end of the bucket list the color report is taken from.
    #[arg(long, global = true)]
    report_order: Option<ReportOrder>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment targets, crop them and name their two main colors.
    Segment {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Name the two main colors of whole images.
    Colors {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Black out the configured color range, writing `<stem>.masked.<ext>`.
    Mask {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Classify dark outline shapes by their vertex count.
    Shape {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Decode QR codes and append them to a CSV log.
    Qr {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_QR_LOG)]
        log: PathBuf,
    },
    /// Read a single letter with tesseract and append it to a dump file.
    Ocr {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_OCR_LOG)]
        log: PathBuf,
    },
    /// Print the EXIF GPS position as JSON.
    Gps {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

impl Args {
    /// Loads the config file and applies the command line overrides.
    fn scan_config(&self) -> anyhow::Result<ScanConfig> {
        let mut config = ScanConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.output_dir {
            config.artifacts.output_dir = dir.clone();
        }
        if self.no_artifacts {
            config.artifacts.enabled = false;
        }
        if let Some(order) = self.report_order {
            config.colors.report_order = order;
        }
        Ok(config)
    }
}

/// Runs `op` on every image. A failing image is logged and the batch goes on.
/// Returns how many images failed.
fn run_batch(images: &[PathBuf], mut op: impl FnMut(&Path) -> anyhow::Result<()>) -> usize {
    let mut failures = 0;
    for path in images {
        let _span = tracing::info_span!("image", path = %path.display()).entered();
        let result = match path.extension().and_then(|os_str| os_str.to_str()) {
            Some(ext) if is_image_extension(ext) => op(path),
            Some(unk) => Err(anyhow::anyhow!("Unhandled file extension: {unk}")),
            None => Err(anyhow::anyhow!("Input path does not have valid file extension")),
        };
        if let Err(e) = result {
            log::error!("{path:?}: {e:#}");
            failures += 1;
        }
    }
    failures
}

fn is_image_extension(ext: &str) -> bool {
    matches!(ext.to_ascii_lowercase().as_str(), "jpeg" | "jpg" | "png")
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warn,targetscan=info,scan_common=info,scan_services=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.scan_config()?;
    log::debug!("{config:?}");

    let (total, failures) = match &args.command {
        Command::Segment { images } => (
            images.len(),
            run_batch(images, |path| process_image::segment(path, &config)),
        ),
        Command::Colors { images } => (
            images.len(),
            run_batch(images, |path| process_image::colors(path, &config)),
        ),
        Command::Mask { images } => (
            images.len(),
            run_batch(images, |path| process_image::mask(path, &config)),
        ),
        Command::Shape { images } => (
            images.len(),
            run_batch(images, |path| process_image::shapes(path, &config)),
        ),
        Command::Qr { images, log } => (
            images.len(),
            run_batch(images, |path| process_services::qr(path, log)),
        ),
        Command::Ocr { images, log } => (
            images.len(),
            run_batch(images, |path| process_services::ocr(path, log)),
        ),
        Command::Gps { images } => (images.len(), run_batch(images, process_services::gps)),
    };

    if failures > 0 {
        anyhow::bail!("{failures} of {total} images failed");
    }
    Ok(())
}
