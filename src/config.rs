//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `clipart-press.toml`. Stock
//! defaults reproduce the production layout exactly; a config file only needs
//! the values it wants to change.
//!
//! ## Config File Location
//!
//! The file is looked up in the working root, or passed with `--config`:
//!
//! ```text
//! Upscaler/                    # Working root
//! ├── clipart-press.toml       # Optional overrides
//! ├── W1/
//! │   ├── watermark.png        # Watermark mark
//! │   └── font.otf             # Caption font
//! ├── lets-get-boho-01.png     # Raw exports (source = ".")
//! ├── Upscaled/
//! ├── WATERMARK/
//! ├── Main Preview/
//! └── ZIP/
//! ```
//!
//! ## Directory Contract
//!
//! Every stage reads and writes directories named in `[directories]`,
//! relative to the working root. Renaming a folder is a config change:
//!
//! ```toml
//! [directories]
//! upscaled = "Masters"
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only change the archive split size
//! [archive]
//! max_bytes = 15000000
//! ```
//!
//! Arrays (`[[collage.captions]]`, `[[delivery.sources]]`) replace the stock
//! list as a whole. Unknown keys are rejected to catch typos early.

use crate::imaging::{Dpi, Quality, Size, Tolerances};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name looked up in the working root.
pub const CONFIG_FILE_NAME: &str = "clipart-press.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `clipart-press.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Named working directories, relative to the root.
    pub directories: DirectoriesConfig,
    /// Main preview collage layout.
    pub collage: CollageConfig,
    /// Master image generation.
    pub upscale: UpscaleConfig,
    /// Watermarked preview generation.
    pub watermark: WatermarkConfig,
    /// Cover + gallery slideshow.
    pub slideshow: SlideshowConfig,
    /// Fixed-rate looping preview video.
    pub loop_video: LoopVideoConfig,
    /// Size-bounded zip bundles.
    pub archive: ArchiveConfig,
    /// Numbered delivery folders.
    pub delivery: DeliveryConfig,
    /// External binaries and their argument templates.
    pub tools: ToolsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collage.validate()?;

        if self.upscale.size.is_empty() {
            return Err(invalid("upscale.size values must be non-zero"));
        }
        check_quality("upscale.quality", self.upscale.quality)?;
        if self.upscale.dpi == 0 {
            return Err(invalid("upscale.dpi must be non-zero"));
        }

        if !(0.0..=1.0).contains(&self.watermark.opacity) {
            return Err(invalid("watermark.opacity must be between 0 and 1"));
        }
        if self.watermark.size.is_empty() {
            return Err(invalid("watermark.size values must be non-zero"));
        }
        check_quality("watermark.quality", self.watermark.quality)?;

        if self.slideshow.total_duration == 0 {
            return Err(invalid("slideshow.total_duration must be non-zero"));
        }
        check_video_size("slideshow.size", self.slideshow.size)?;

        self.loop_video.validate()?;

        if self.archive.max_bytes == 0 {
            return Err(invalid("archive.max_bytes must be non-zero"));
        }
        if self.archive.extensions.is_empty() {
            return Err(invalid("archive.extensions must not be empty"));
        }

        if self.delivery.destination.trim().is_empty() {
            return Err(invalid("delivery.destination must not be empty"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn check_quality(key: &str, quality: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&quality) {
        return Err(invalid(format!("{key} must be 1-100")));
    }
    Ok(())
}

/// yuv420p needs even, non-zero frame dimensions.
fn check_video_size(key: &str, size: Size) -> Result<(), ConfigError> {
    if size.is_empty() || size.width % 2 != 0 || size.height % 2 != 0 {
        return Err(invalid(format!("{key} must be non-zero and even, got {size}")));
    }
    Ok(())
}

/// Parse `#rrggbb` or `#rgb` into an RGB color.
pub fn parse_hex_color(value: &str) -> Result<Rgb<u8>, ConfigError> {
    let hex = value.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        _ if !hex.is_ascii() => return Err(invalid(format!("invalid color '{value}'"))),
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(invalid(format!("invalid color '{value}'"))),
    };
    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map_err(|_| invalid(format!("invalid color '{value}'")))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

// =============================================================================
// [directories]
// =============================================================================

/// Working directory names, relative to the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoriesConfig {
    /// Raw exports.
    pub source: String,
    /// Master images written by the upscale stage.
    pub upscaled: String,
    /// Watermarked previews and the slideshow video.
    pub watermarked: String,
    /// The collage ("main preview").
    pub main_preview: String,
    /// Zip bundles.
    pub archives: String,
    /// Watermark mark file.
    pub watermark_mark: String,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            source: ".".to_string(),
            upscaled: "Upscaled".to_string(),
            watermarked: "WATERMARK".to_string(),
            main_preview: "Main Preview".to_string(),
            archives: "ZIP".to_string(),
            watermark_mark: "W1/watermark.png".to_string(),
        }
    }
}

/// Directory contract resolved against a working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirs {
    pub root: PathBuf,
    pub source: PathBuf,
    pub upscaled: PathBuf,
    pub watermarked: PathBuf,
    pub main_preview: PathBuf,
    pub archives: PathBuf,
    pub watermark_mark: PathBuf,
}

impl DirectoriesConfig {
    pub fn resolve(&self, root: &Path) -> WorkingDirs {
        WorkingDirs {
            root: root.to_path_buf(),
            source: root.join(&self.source),
            upscaled: root.join(&self.upscaled),
            watermarked: root.join(&self.watermarked),
            main_preview: root.join(&self.main_preview),
            archives: root.join(&self.archives),
            watermark_mark: root.join(&self.watermark_mark),
        }
    }
}

// =============================================================================
// [collage]
// =============================================================================

/// Horizontal anchor of a caption block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Midpoint of the leftmost grid column.
    Left,
    /// Canvas midpoint.
    Center,
    /// Midpoint of the rightmost grid column.
    Right,
}

/// One block of caption lines in the footer band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptionConfig {
    pub lines: Vec<String>,
    pub anchor: Anchor,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Pixels added to the anchor x.
    #[serde(default)]
    pub x_offset: i32,
}

fn default_font_size() -> f32 {
    50.0
}

impl CaptionConfig {
    fn new(lines: &[&str], anchor: Anchor, font_size: f32, x_offset: i32) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            anchor,
            font_size,
            x_offset,
        }
    }
}

/// Collage canvas layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollageConfig {
    pub canvas: Size,
    pub cell: Size,
    pub columns: u32,
    pub rows: u32,
    /// Blank rows above the grid.
    pub top_margin: u32,
    /// Solid band painted at the bottom of the canvas.
    pub footer_height: u32,
    /// Height of the region captions are centered in, measured from the bottom.
    pub caption_area_height: u32,
    /// Extra downward shift applied to every caption block.
    pub caption_offset: i32,
    pub line_spacing: u32,
    pub background: String,
    pub footer_color: String,
    pub text_color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    /// TrueType/OpenType font, relative to the root.
    pub font_path: String,
    pub quality: u32,
    /// Output file name inside the main preview directory.
    pub output_name: String,
    pub captions: Vec<CaptionConfig>,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            canvas: Size::square(2048),
            cell: Size::square(512),
            columns: 4,
            rows: 3,
            top_margin: 50,
            footer_height: 400,
            caption_area_height: 380,
            caption_offset: 20,
            line_spacing: 20,
            background: "#ffffff".to_string(),
            footer_color: "#ede3db".to_string(),
            text_color: "#000000".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 1,
            font_path: "W1/font.otf".to_string(),
            quality: 95,
            output_name: "Main Preview.jpg".to_string(),
            captions: vec![
                CaptionConfig::new(&["TRANSPARENT", "BACKGROUND"], Anchor::Left, 50.0, 35),
                CaptionConfig::new(&["300 DPI", "4600x4600px"], Anchor::Right, 50.0, 0),
                CaptionConfig::new(&["PNG", "CLIPART"], Anchor::Center, 80.0, 0),
            ],
        }
    }
}

impl CollageConfig {
    /// Number of grid cells.
    pub fn capacity(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(invalid("collage.columns and collage.rows must be non-zero"));
        }
        if self.canvas.is_empty() || self.cell.is_empty() {
            return Err(invalid("collage.canvas and collage.cell must be non-zero"));
        }
        let grid_height = self.top_margin + self.rows * self.cell.height;
        if grid_height + self.footer_height > self.canvas.height {
            return Err(invalid(format!(
                "collage grid ({grid_height}px) plus footer ({}px) exceeds canvas height ({}px)",
                self.footer_height, self.canvas.height
            )));
        }
        if self.columns * self.cell.width > self.canvas.width {
            return Err(invalid("collage grid is wider than the canvas"));
        }
        if self.caption_area_height > self.canvas.height {
            return Err(invalid("collage.caption_area_height exceeds canvas height"));
        }
        check_quality("collage.quality", self.quality)?;
        for color in [
            &self.background,
            &self.footer_color,
            &self.text_color,
            &self.stroke_color,
        ] {
            parse_hex_color(color)?;
        }
        if self.captions.iter().any(|c| c.font_size <= 0.0) {
            return Err(invalid("collage.captions font_size must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// [upscale] / [watermark]
// =============================================================================

/// How transparent masters fill the square frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlphaFit {
    /// Resample to the full frame, ignoring aspect ratio.
    Stretch,
    /// Fit inside the frame on a transparent canvas.
    Letterbox,
}

/// Master image generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpscaleConfig {
    pub size: Size,
    pub alpha_fit: AlphaFit,
    /// JPEG quality for opaque masters.
    pub quality: u32,
    /// Density stamped into both PNG and JPEG masters.
    pub dpi: u16,
    /// Output names are `{prefix}-01`, `{prefix}-02`, …
    pub prefix: String,
    /// Sharpen opaque masters after resampling.
    pub sharpen: bool,
    /// Run the PNG optimizer on transparent masters.
    pub optimize: bool,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            size: Size::square(4600),
            alpha_fit: AlphaFit::Stretch,
            quality: 95,
            dpi: 300,
            prefix: "Clipart".to_string(),
            sharpen: true,
            optimize: true,
        }
    }
}

impl UpscaleConfig {
    pub fn jpeg_quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    pub fn density(&self) -> Dpi {
        Dpi(self.dpi)
    }
}

/// Watermarked preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Alpha multiplier applied to the mark.
    pub opacity: f32,
    /// Final preview size.
    pub size: Size,
    pub quality: u32,
    /// Output names are `{prefix}-01.jpg`, `{prefix}-02.jpg`, …
    pub prefix: String,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            opacity: 0.12,
            size: Size::square(2000),
            quality: 95,
            prefix: "Preview".to_string(),
        }
    }
}

// =============================================================================
// [slideshow] / [loop_video]
// =============================================================================

/// Cover + gallery slideshow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlideshowConfig {
    /// Whole-video length in seconds; the frame rate is derived from it.
    pub total_duration: u32,
    /// Frame size; every frame is letterboxed onto white.
    pub size: Size,
    /// Output file name inside the watermarked directory.
    pub output_name: String,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            total_duration: 8,
            size: Size::square(2000),
            output_name: "output.mp4".to_string(),
        }
    }
}

/// How each loop-video frame is normalized to a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameTransform {
    /// Tiered square/near-square/other crop.
    AspectAware,
    /// Stretch to `target`, crop the center.
    CropCentered,
    /// Pad to a white square of `crop` size.
    Letterbox,
}

/// Fixed-rate looping preview video settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopVideoConfig {
    pub fps: u32,
    /// Seconds one pass over the images should take.
    pub loop_duration: u32,
    /// Seconds of video written in total.
    pub total_duration: u32,
    pub transform: FrameTransform,
    /// Stretch size for non-square inputs.
    pub target: Size,
    /// Output frame size.
    pub crop: Size,
    /// Short-side size for near-square inputs before cropping.
    pub intermediate: u32,
    pub tolerances: Tolerances,
    /// Output file name inside the source directory.
    pub output_name: String,
}

impl Default for LoopVideoConfig {
    fn default() -> Self {
        Self {
            fps: 25,
            loop_duration: 5,
            total_duration: 10,
            transform: FrameTransform::AspectAware,
            target: Size::new(3000, 2400),
            crop: Size::square(2300),
            intermediate: 2400,
            tolerances: Tolerances::default(),
            output_name: "preview_video.mp4".to_string(),
        }
    }
}

impl LoopVideoConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.loop_duration == 0 || self.total_duration == 0 {
            return Err(invalid(
                "loop_video.fps, loop_duration and total_duration must be non-zero",
            ));
        }
        check_video_size("loop_video.crop", self.crop)?;
        if !self.target.contains(self.crop) {
            return Err(invalid(format!(
                "loop_video.crop ({}) must fit inside loop_video.target ({})",
                self.crop, self.target
            )));
        }
        if self.intermediate < self.crop.width.max(self.crop.height) {
            return Err(invalid(
                "loop_video.intermediate must be at least the larger crop side",
            ));
        }
        let t = self.tolerances;
        if t.tight > t.loose || t.loose >= 100 {
            return Err(invalid(
                "loop_video.tolerances must satisfy tight <= loose < 100",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// [archive] / [delivery]
// =============================================================================

/// Size-bounded zip bundle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Upper bound on summed input bytes per archive.
    pub max_bytes: u64,
    /// Lowercase extensions that go into archives.
    pub extensions: Vec<String>,
    /// Directory to bundle, relative to the root. Defaults to the upscaled directory.
    pub source: Option<String>,
    /// Archive base name. Defaults to the first raw export's stem without its `-NN` suffix.
    pub base_name: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            extensions: ["png", "jpg", "jpeg", "eps", "pdf", "dxf", "svg"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            source: None,
            base_name: None,
        }
    }
}

/// A directory moved into each delivery slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySource {
    /// Directory relative to the root.
    pub path: String,
    /// Move the directory's files into this slot subfolder instead of
    /// moving the directory itself.
    #[serde(default)]
    pub flatten_into: Option<String>,
}

/// Numbered delivery folder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Root holding the `N - Title` folders (usually a synced drive).
    /// Relative paths resolve against the working root.
    pub destination: String,
    pub sources: Vec<DeliverySource>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        let plain = |p: &str| DeliverySource {
            path: p.to_string(),
            flatten_into: None,
        };
        Self {
            destination: "Delivered".to_string(),
            sources: vec![
                plain("Upscaled"),
                plain("WATERMARK"),
                plain("ZIP"),
                DeliverySource {
                    path: "Main Preview".to_string(),
                    flatten_into: Some("WATERMARK".to_string()),
                },
            ],
        }
    }
}

// =============================================================================
// [tools] / [processing]
// =============================================================================

/// External binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Video encoder binary (name on PATH or absolute path).
    pub ffmpeg: String,
    /// Output-side encoder arguments, placed between the raw input and the output path.
    pub ffmpeg_args: Vec<String>,
    /// PNG optimizer binary.
    pub pngquant: String,
    /// Optimizer arguments, followed by `--output OUT IN`.
    pub pngquant_args: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let owned = |args: &[&str]| args.iter().map(|a| a.to_string()).collect();
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffmpeg_args: owned(&[
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]),
            pngquant: "pngquant".to_string(),
            pngquant_args: owned(&["--quality=40-60", "--force"]),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the pipeline config for a working root.
///
/// An explicit path must exist; otherwise `clipart-press.toml` in `root` is
/// used when present. User values are merged on top of stock defaults,
/// unknown keys are rejected, and the result is validated.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(&root.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `clipart-press.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# clipart-press configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at <root>/clipart-press.toml or pass --config PATH.
# Arrays of tables ([[...]]) replace the stock list as a whole.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Working directories (relative to the root)
# ---------------------------------------------------------------------------
[directories]
source = "."
upscaled = "Upscaled"
watermarked = "WATERMARK"
main_preview = "Main Preview"
archives = "ZIP"
watermark_mark = "W1/watermark.png"

# ---------------------------------------------------------------------------
# Main preview collage
# ---------------------------------------------------------------------------
[collage]
canvas = [2048, 2048]
cell = [512, 512]
columns = 4
rows = 3
# Blank rows above the grid.
top_margin = 50
# Solid band at the bottom of the canvas.
footer_height = 400
# Captions are centered inside the bottom caption_area_height pixels,
# then shifted down by caption_offset.
caption_area_height = 380
caption_offset = 20
line_spacing = 20
background = "#ffffff"
footer_color = "#ede3db"
text_color = "#000000"
stroke_color = "#000000"
stroke_width = 1
# Required whenever captions are configured.
font_path = "W1/font.otf"
quality = 95
output_name = "Main Preview.jpg"

# anchor: left (leftmost column midpoint), center (canvas midpoint),
# right (rightmost column midpoint). x_offset shifts the anchor.
[[collage.captions]]
lines = ["TRANSPARENT", "BACKGROUND"]
anchor = "left"
font_size = 50.0
x_offset = 35

[[collage.captions]]
lines = ["300 DPI", "4600x4600px"]
anchor = "right"
font_size = 50.0
x_offset = 0

[[collage.captions]]
lines = ["PNG", "CLIPART"]
anchor = "center"
font_size = 80.0
x_offset = 0

# ---------------------------------------------------------------------------
# Master images
# ---------------------------------------------------------------------------
[upscale]
size = [4600, 4600]
# Transparent masters: "stretch" to the full frame or "letterbox" to keep aspect.
alpha_fit = "stretch"
# JPEG quality for opaque masters.
quality = 95
dpi = 300
prefix = "Clipart"
sharpen = true
# Run pngquant on transparent masters (skipped with a warning if missing).
optimize = true

# ---------------------------------------------------------------------------
# Watermarked previews
# ---------------------------------------------------------------------------
[watermark]
opacity = 0.12
size = [2000, 2000]
quality = 95
prefix = "Preview"

# ---------------------------------------------------------------------------
# Cover + gallery slideshow (frame rate derived from total_duration)
# ---------------------------------------------------------------------------
[slideshow]
total_duration = 8
size = [2000, 2000]
output_name = "output.mp4"

# ---------------------------------------------------------------------------
# Looping preview video (fixed frame rate)
# ---------------------------------------------------------------------------
[loop_video]
fps = 25
loop_duration = 5
total_duration = 10
# aspect-aware | crop-centered | letterbox
transform = "aspect-aware"
target = [3000, 2400]
crop = [2300, 2300]
intermediate = 2400
output_name = "preview_video.mp4"

# Square-ness bands in percent: within tight = square, within loose = near-square.
[loop_video.tolerances]
tight = 5
loose = 10

# ---------------------------------------------------------------------------
# Zip bundles
# ---------------------------------------------------------------------------
[archive]
# 20 MB per archive; a larger single file still gets its own archive.
max_bytes = 20971520
extensions = ["png", "jpg", "jpeg", "eps", "pdf", "dxf", "svg"]
# Directory to bundle (default: the upscaled directory).
# source = "Upscaled"
# Archive base name (default: first raw export's stem without -NN).
# base_name = "lets-get-boho"

# ---------------------------------------------------------------------------
# Delivery
# ---------------------------------------------------------------------------
[delivery]
destination = "Delivered"

[[delivery.sources]]
path = "Upscaled"

[[delivery.sources]]
path = "WATERMARK"

[[delivery.sources]]
path = "ZIP"

[[delivery.sources]]
path = "Main Preview"
flatten_into = "WATERMARK"

# ---------------------------------------------------------------------------
# External tools
# ---------------------------------------------------------------------------
[tools]
ffmpeg = "ffmpeg"
ffmpeg_args = ["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"]
pngquant = "pngquant"
pngquant_args = ["--quality=40-60", "--force"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
