//! Raw-frame video encoding through the system `ffmpeg` binary.
//!
//! Frames are produced in-process as RGB rasters and streamed to ffmpeg's
//! stdin as `rawvideo`/`rgb24`. The encoder writes to a hidden partial file
//! next to the destination and renames it on success, so a failed encode
//! never leaves a truncated video under the real name.
//!
//! The [`FrameSink`] trait is the seam between frame planning and encoding;
//! tests drive the slideshow stages through a recording sink instead of a
//! real ffmpeg process.

use crate::tools::{ToolError, resolve_tool};
use image::RgbImage;
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Invalid encode settings: {0}")]
    Invalid(String),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rational frame rate, passed to ffmpeg verbatim as `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub const fn whole(fps: u32) -> Self {
        Self::new(fps, 1)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub rate: FrameRate,
    pub out_path: PathBuf,
    /// Binary name or path.
    pub ffmpeg: String,
    /// Output-side arguments (codec, pixel format, container flags).
    pub output_args: Vec<String>,
}

impl EncodeConfig {
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.width == 0 || self.height == 0 {
            return Err(EncodeError::Invalid("width/height must be non-zero".into()));
        }
        if self.rate.num == 0 || self.rate.den == 0 {
            return Err(EncodeError::Invalid("frame rate must be non-zero".into()));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output
            return Err(EncodeError::Invalid(format!(
                "width/height must be even, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Hidden sibling that keeps the container extension for ffmpeg's muxer guess.
    ///
    /// `WATERMARK/output.mp4` → `WATERMARK/.output.partial.mp4`
    pub fn partial_path(&self) -> PathBuf {
        let stem = self
            .out_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.out_path.extension() {
            Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
            None => format!(".{stem}.partial"),
        };
        self.out_path.with_file_name(name)
    }

    /// Full ffmpeg argument list writing to `target`.
    pub fn command_args(&self, target: &Path) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("{}x{}", self.width, self.height));
        args.push("-r".into());
        args.push(self.rate.to_string());
        args.extend(["-i", "pipe:0", "-an"].map(String::from));
        args.extend(self.output_args.iter().cloned());
        args.push(target.to_string_lossy().into_owned());
        args
    }
}

pub fn is_ffmpeg_on_path(binary: &str) -> bool {
    resolve_tool(binary).is_ok()
}

/// Destination for an exact sequence of equally sized RGB frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), EncodeError>;

    /// Flush and finalize. Consumes the sink.
    fn finish(self) -> Result<(), EncodeError>
    where
        Self: Sized;
}

pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    tool: String,
    partial: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> Result<Self, EncodeError> {
        cfg.validate()?;
        let binary = resolve_tool(&cfg.ffmpeg)?;
        if let Some(parent) = cfg.out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let partial = cfg.partial_path();
        let tool = cfg.ffmpeg.clone();
        let mut child = Command::new(&binary)
            .args(cfg.command_args(&partial))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        tracing::debug!(out = %cfg.out_path.display(), rate = %cfg.rate, "ffmpeg started");
        Ok(Self {
            cfg,
            tool,
            partial,
            child: Some(child),
            stdin,
        })
    }

    /// Wait for ffmpeg and turn a failed exit into [`ToolError::Failed`].
    fn wait(&mut self) -> Result<(), EncodeError> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: self.tool.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), EncodeError> {
        if frame.dimensions() != (self.cfg.width, self.cfg.height) {
            return Err(EncodeError::Invalid(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(EncodeError::Invalid("encoder already finished".into()));
        };
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // ffmpeg closed the pipe; its stderr says why
            self.wait()?;
            return Err(e.into());
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), EncodeError> {
        self.wait()?;
        fs::rename(&self.partial, &self.cfg.out_path)?;
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = fs::remove_file(&self.partial);
    }
}
