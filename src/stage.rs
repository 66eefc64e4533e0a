//! Stage identifiers, requests, reports, and in-process dispatch.
//!
//! The set of stages is closed: each [`StageId`] maps to one function in this
//! crate, and [`Pipeline::run`] is the only place that wires them to the
//! directory contract. External processes are spawned by the stages
//! themselves (ffmpeg, pngquant), never to sequence stages.
//!
//! ## Contract table
//!
//! | Stage | Reads | Writes |
//! |---|---|---|
//! | `collage` | source | main preview |
//! | `upscale` | source | upscaled |
//! | `watermark` | source + mark file | watermarked |
//! | `slideshow` | main preview, watermarked (or upscaled) | watermarked |
//! | `loop-video` | source | source |
//! | `archive` | archive source (upscaled) | archives |
//! | `deliver` | delivery sources | delivery destination |

use crate::config::{ConfigError, PipelineConfig, WorkingDirs};
use crate::imaging::ImagingError;
use crate::imaging::text::TextError;
use crate::scan::{self, ScanError};
use crate::encode_ffmpeg::EncodeError;
use crate::tools::Pngquant;
use crate::{archive, collage, delivery, slideshow, upscale, watermark};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("No eligible input files in {}", .0.display())]
    EmptyInput(PathBuf),
    #[error("Required directory missing: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("Required file missing: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("Video encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("Caption font: {0}")]
    Font(#[from] TextError),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Delivery error: {0}")]
    Delivery(String),
    #[error("Invalid name '{0}': must be non-empty and free of path separators")]
    InvalidName(String),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Unknown stage '{0}'")]
    UnknownStage(String),
}

impl From<ScanError> for StageError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Io(e) => StageError::Io(e),
            ScanError::MissingDirectory(p) => StageError::MissingDirectory(p),
        }
    }
}

/// The closed set of pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Collage,
    Upscale,
    Watermark,
    Slideshow,
    LoopVideo,
    Archive,
    Deliver,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::Collage,
        StageId::Upscale,
        StageId::Watermark,
        StageId::Slideshow,
        StageId::LoopVideo,
        StageId::Archive,
        StageId::Deliver,
    ];

    /// Stages run by `build`, in order.
    pub const BUILD: [StageId; 6] = [
        StageId::Collage,
        StageId::Watermark,
        StageId::Upscale,
        StageId::Slideshow,
        StageId::Archive,
        StageId::Deliver,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageId::Collage => "collage",
            StageId::Upscale => "upscale",
            StageId::Watermark => "watermark",
            StageId::Slideshow => "slideshow",
            StageId::LoopVideo => "loop-video",
            StageId::Archive => "archive",
            StageId::Deliver => "deliver",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StageId {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        StageId::ALL
            .into_iter()
            .find(|id| id.name() == wanted)
            .ok_or_else(|| StageError::UnknownStage(s.trim().to_string()))
    }
}

/// Per-request overrides from the trigger surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOptions {
    /// Delivery slot title.
    pub title: Option<String>,
    /// Archive base name.
    pub archive_name: Option<String>,
}

/// One stage invocation: what runs and which directories it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub stage: StageId,
    /// Directories that must exist before the stage starts.
    pub inputs: Vec<PathBuf>,
    /// Directory the stage writes into.
    pub output: PathBuf,
    pub options: StageOptions,
}

/// A file a batch stage could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a stage that ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: StageId,
    /// Inputs turned into output.
    pub processed: usize,
    pub skipped: Vec<SkippedFile>,
    /// Files or directories written, in order.
    pub outputs: Vec<PathBuf>,
    /// Non-fatal remarks (optimizer failures, fallbacks taken).
    pub notes: Vec<String>,
}

impl StageReport {
    pub fn new(stage: StageId) -> Self {
        Self {
            stage,
            processed: 0,
            skipped: Vec::new(),
            outputs: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn skip(&mut self, path: &Path, reason: impl fmt::Display) {
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        });
    }

    /// One-line summary: `upscale: 10 processed, 2 skipped`.
    pub fn summary(&self) -> String {
        let mut line = format!("{}: {} processed", self.stage, self.processed);
        if !self.skipped.is_empty() {
            line.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        line
    }
}

/// A configured working root, ready to run stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub config: PipelineConfig,
    pub dirs: WorkingDirs,
}

impl Pipeline {
    pub fn new(root: &Path, config: PipelineConfig) -> Self {
        let dirs = config.directories.resolve(root);
        Self { config, dirs }
    }

    pub fn archive_source(&self) -> PathBuf {
        match &self.config.archive.source {
            Some(dir) => self.dirs.root.join(dir),
            None => self.dirs.upscaled.clone(),
        }
    }

    pub fn delivery_destination(&self) -> PathBuf {
        self.dirs.root.join(&self.config.delivery.destination)
    }

    /// Build the request for `stage` from the directory contract.
    pub fn request(&self, stage: StageId, options: StageOptions) -> StageRequest {
        let d = &self.dirs;
        let (inputs, output) = match stage {
            StageId::Collage => (vec![d.source.clone()], d.main_preview.clone()),
            StageId::Upscale => (vec![d.source.clone()], d.upscaled.clone()),
            StageId::Watermark => (vec![d.source.clone()], d.watermarked.clone()),
            StageId::Slideshow => (vec![d.main_preview.clone()], d.watermarked.clone()),
            StageId::LoopVideo => (vec![d.source.clone()], d.source.clone()),
            StageId::Archive => (vec![self.archive_source()], d.archives.clone()),
            StageId::Deliver => (Vec::new(), self.delivery_destination()),
        };
        StageRequest {
            stage,
            inputs,
            output,
            options,
        }
    }

    /// Check the contract, then run the stage in-process.
    #[tracing::instrument(skip_all, fields(stage = %request.stage))]
    pub fn run(&self, request: &StageRequest) -> Result<StageReport, StageError> {
        for dir in &request.inputs {
            scan::require_dir(dir)?;
        }
        let cfg = &self.config;
        let d = &self.dirs;
        match request.stage {
            StageId::Collage => collage::run(
                &d.source,
                &request.output,
                &cfg.collage,
                &d.root.join(&cfg.collage.font_path),
            ),
            StageId::Upscale => {
                let optimizer = Pngquant::new(&cfg.tools.pngquant, cfg.tools.pngquant_args.clone());
                upscale::run(&d.source, &request.output, &cfg.upscale, &optimizer)
            }
            StageId::Watermark => watermark::run(
                &d.source,
                &request.output,
                &d.watermark_mark,
                &cfg.watermark,
            ),
            StageId::Slideshow => slideshow::run_cover(
                &slideshow::CoverDirs {
                    cover: d.main_preview.clone(),
                    gallery: d.watermarked.clone(),
                    fallback: d.upscaled.clone(),
                    output: request.output.clone(),
                },
                &cfg.slideshow,
                &cfg.tools,
            ),
            StageId::LoopVideo => {
                slideshow::run_loop(&d.source, &request.output, &cfg.loop_video, &cfg.tools)
            }
            StageId::Archive => archive::run(
                &self.archive_source(),
                &request.output,
                &cfg.archive,
                request.options.archive_name.as_deref(),
                &d.source,
            ),
            StageId::Deliver => {
                let title = match &request.options.title {
                    Some(title) => title.clone(),
                    None => delivery::default_title(&d.source, &self.archive_source(), &cfg.archive)?,
                };
                delivery::run(&d.root, &request.output, &title, &cfg.delivery.sources)
            }
        }
    }
}
