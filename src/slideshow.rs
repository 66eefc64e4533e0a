//! Frame-accurate preview videos.
//!
//! Two stages share one assembler:
//!
//! - **Cover** (`slideshow`): the collage cover followed by one frame per
//!   gallery image, at a rational frame rate chosen so the whole video lasts
//!   exactly `total_duration` seconds.
//! - **Frame repeat** (`loop-video`): every source image held for
//!   `frames_per_image` frames, the sequence cycled and truncated mid-cycle
//!   so the video has exactly `fps × total_duration` frames.
//!
//! Frame counts are decided up front by a [`FramePlan`], a pure value, and
//! the assembler writes exactly [`FramePlan::total_frames`] frames into a
//! [`FrameSink`].
//!
//! ## Worked example
//!
//! ```text
//! loop-video, 10 images, fps 25, loop 5 s, total 10 s
//!   frames_per_image = 25 × 5 / 10 = 12
//!   total_frames     = 25 × 10     = 250
//!   frames 0..120   → images 0..9, 12 frames each
//!   frames 120..240 → images 0..9 again
//!   frames 240..250 → image 0 (cut after 10 frames)
//! ```

use crate::config::{FrameTransform, LoopVideoConfig, SlideshowConfig, ToolsConfig};
use crate::encode_ffmpeg::{EncodeConfig, EncodeError, FfmpegEncoder, FrameRate, FrameSink};
use crate::imaging::transform::{resize_and_crop_aspect_aware, resize_crop_centered, resize_letterbox};
use crate::imaging::{Size, load_image};
use crate::scan::{self, IMAGE_EXTENSIONS, JPEG_EXTENSIONS};
use crate::stage::{StageError, StageId, StageReport};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};

/// How many frames to emit and at what rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub rate: FrameRate,
    pub frames_per_image: u32,
    pub total_frames: u64,
    pub size: Size,
}

impl FramePlan {
    /// Index into the image list for every output frame, in order.
    pub fn frame_sequence(&self, image_count: usize) -> impl Iterator<Item = usize> + use<> {
        let per = u64::from(self.frames_per_image.max(1));
        let count = image_count.max(1) as u64;
        (0..self.total_frames).map(move |f| ((f / per) % count) as usize)
    }
}

/// Cover plus `gallery_count` images, one frame each, over `total_duration` seconds.
pub fn plan_cover(gallery_count: usize, total_duration: u32, size: Size) -> FramePlan {
    let frames = gallery_count as u32 + 1;
    FramePlan {
        rate: FrameRate::new(frames, total_duration),
        frames_per_image: 1,
        total_frames: u64::from(frames),
        size,
    }
}

/// Fixed-rate repeat plan. `frames_per_image` is clamped to at least 1 so a
/// large image count still advances.
pub fn plan_repeat(
    image_count: usize,
    fps: u32,
    loop_duration: u32,
    total_duration: u32,
    size: Size,
) -> FramePlan {
    let count = image_count.max(1) as u64;
    let per_image = (u64::from(fps) * u64::from(loop_duration) / count).max(1);
    FramePlan {
        rate: FrameRate::whole(fps),
        frames_per_image: u32::try_from(per_image).unwrap_or(u32::MAX),
        total_frames: u64::from(fps) * u64::from(total_duration),
        size,
    }
}

/// Render and write every frame of `plan`. Returns the number of frames written.
///
/// Each source is decoded when the sequence reaches it and the rendered frame
/// is reused for its repeats. Any decode failure aborts the assembly; the sink
/// is dropped unfinished.
pub fn assemble<S, R>(
    images: &[PathBuf],
    plan: &FramePlan,
    render: R,
    sink: &mut S,
) -> Result<u64, StageError>
where
    S: FrameSink,
    R: Fn(&DynamicImage) -> RgbImage,
{
    let mut current: Option<(usize, RgbImage)> = None;
    let mut written = 0u64;
    for index in plan.frame_sequence(images.len()) {
        let cached = matches!(&current, Some((i, _)) if *i == index);
        if !cached {
            let image = load_image(&images[index])?;
            current = Some((index, render(&image)));
        }
        if let Some((_, frame)) = &current {
            sink.write_frame(frame)?;
            written += 1;
        }
    }
    Ok(written)
}

fn encode_config(plan: &FramePlan, out_path: PathBuf, tools: &ToolsConfig) -> EncodeConfig {
    EncodeConfig {
        width: plan.size.width,
        height: plan.size.height,
        rate: plan.rate,
        out_path,
        ffmpeg: tools.ffmpeg.clone(),
        output_args: tools.ffmpeg_args.clone(),
    }
}

// ============================================================================
// Cover mode
// ============================================================================

/// Directories the cover slideshow reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverDirs {
    /// First JPEG here is the cover.
    pub cover: PathBuf,
    pub gallery: PathBuf,
    /// Used when `gallery` is missing or has no images.
    pub fallback: PathBuf,
    pub output: PathBuf,
}

/// Cover first, then the gallery. The flag is true when the fallback was used.
pub fn cover_sequence(dirs: &CoverDirs) -> Result<(Vec<PathBuf>, bool), StageError> {
    let cover = scan::list_files(&dirs.cover, JPEG_EXTENSIONS)?
        .into_iter()
        .next()
        .ok_or_else(|| StageError::EmptyInput(dirs.cover.clone()))?;

    let mut gallery = scan::list_files_if_present(&dirs.gallery, IMAGE_EXTENSIONS)?;
    let mut fell_back = false;
    if gallery.is_empty() {
        gallery = scan::list_files_if_present(&dirs.fallback, IMAGE_EXTENSIONS)?;
        fell_back = true;
    }

    let mut sequence = Vec::with_capacity(gallery.len() + 1);
    sequence.push(cover);
    sequence.extend(gallery);
    Ok((sequence, fell_back))
}

pub fn run_cover_with<S, F>(
    dirs: &CoverDirs,
    config: &SlideshowConfig,
    tools: &ToolsConfig,
    open_sink: F,
) -> Result<StageReport, StageError>
where
    S: FrameSink,
    F: FnOnce(EncodeConfig) -> Result<S, EncodeError>,
{
    let (sequence, fell_back) = cover_sequence(dirs)?;
    let plan = plan_cover(sequence.len() - 1, config.total_duration, config.size);
    let out_path = dirs.output.join(&config.output_name);

    let mut report = StageReport::new(StageId::Slideshow);
    if fell_back {
        tracing::warn!(fallback = %dirs.fallback.display(), "no watermarked previews, using upscaled masters");
        report
            .notes
            .push(format!("gallery taken from {}", dirs.fallback.display()));
    }
    tracing::info!(frames = plan.total_frames, rate = %plan.rate, "assembling cover slideshow");

    let mut sink = open_sink(encode_config(&plan, out_path.clone(), tools))?;
    let written = assemble(&sequence, &plan, |img| resize_letterbox(img, plan.size), &mut sink)?;
    sink.finish()?;

    report.processed = sequence.len();
    report.outputs.push(out_path);
    report
        .notes
        .push(format!("{written} frames at {} fps", plan.rate));
    Ok(report)
}

#[tracing::instrument(skip_all, fields(cover = %dirs.cover.display()))]
pub fn run_cover(
    dirs: &CoverDirs,
    config: &SlideshowConfig,
    tools: &ToolsConfig,
) -> Result<StageReport, StageError> {
    run_cover_with(dirs, config, tools, FfmpegEncoder::new)
}

// ============================================================================
// Frame-repeat mode
// ============================================================================

/// Frame renderer for the configured transform. Output is always `config.crop`.
pub fn loop_frame(image: &DynamicImage, config: &LoopVideoConfig) -> RgbImage {
    match config.transform {
        FrameTransform::AspectAware => resize_and_crop_aspect_aware(
            image,
            config.target,
            config.crop,
            config.intermediate,
            config.tolerances,
        ),
        FrameTransform::CropCentered => resize_crop_centered(image, config.target, config.crop),
        FrameTransform::Letterbox => resize_letterbox(image, config.crop),
    }
}

pub fn run_loop_with<S, F>(
    source_dir: &Path,
    output_dir: &Path,
    config: &LoopVideoConfig,
    tools: &ToolsConfig,
    open_sink: F,
) -> Result<StageReport, StageError>
where
    S: FrameSink,
    F: FnOnce(EncodeConfig) -> Result<S, EncodeError>,
{
    let images = scan::list_files(source_dir, JPEG_EXTENSIONS)?;
    if images.is_empty() {
        return Err(StageError::EmptyInput(source_dir.to_path_buf()));
    }
    let plan = plan_repeat(
        images.len(),
        config.fps,
        config.loop_duration,
        config.total_duration,
        config.crop,
    );
    tracing::info!(
        images = images.len(),
        frames_per_image = plan.frames_per_image,
        total = plan.total_frames,
        "assembling loop video"
    );

    let out_path = output_dir.join(&config.output_name);
    let mut sink = open_sink(encode_config(&plan, out_path.clone(), tools))?;
    let written = assemble(&images, &plan, |img| loop_frame(img, config), &mut sink)?;
    sink.finish()?;

    let mut report = StageReport::new(StageId::LoopVideo);
    report.processed = images.len();
    report.outputs.push(out_path);
    report.notes.push(format!(
        "{written} frames, {} per image at {} fps",
        plan.frames_per_image, plan.rate
    ));
    Ok(report)
}

#[tracing::instrument(skip_all, fields(source = %source_dir.display()))]
pub fn run_loop(
    source_dir: &Path,
    output_dir: &Path,
    config: &LoopVideoConfig,
    tools: &ToolsConfig,
) -> Result<StageReport, StageError> {
    run_loop_with(source_dir, output_dir, config, tools, FfmpegEncoder::new)
}
