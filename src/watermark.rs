//! Watermarked listing previews.
//!
//! The mark (a transparent PNG, `W1/watermark.png` by default) is fitted
//! inside each source image, faded to the configured opacity, and composited
//! over the center. The result is flattened onto white, resized to the
//! preview size and written as `Preview-01.jpg`, `Preview-02.jpg`, ….

use crate::batch::{self, Staged};
use crate::config::WatermarkConfig;
use crate::imaging::calculations::fit_within;
use crate::imaging::codec::image_size;
use crate::imaging::transform::{WHITE, flatten_alpha, overlay_centered, reduce_opacity};
use crate::imaging::{ImagingError, Quality, Size, load_image, save_jpeg};
use crate::scan::{self, IMAGE_EXTENSIONS};
use crate::stage::{StageError, StageId, StageReport};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Composite `mark` over `source` and produce the flattened preview raster.
pub fn apply_watermark(source: &DynamicImage, mark: &RgbaImage, config: &WatermarkConfig) -> image::RgbImage {
    let mut base = source.to_rgba8();
    let fitted = fit_within(Size::new(mark.width(), mark.height()), image_size(source));
    let scaled = imageops::resize(mark, fitted.width, fitted.height, FilterType::Lanczos3);
    overlay_centered(&mut base, &reduce_opacity(scaled, config.opacity));

    let flat = flatten_alpha(&DynamicImage::ImageRgba8(base), WHITE);
    imageops::resize(&flat, config.size.width, config.size.height, FilterType::Lanczos3)
}

/// Eligible sources: images in `source_dir` other than the mark itself.
pub fn watermark_inputs(source_dir: &Path, mark: &Path) -> Result<Vec<PathBuf>, StageError> {
    let mark_name = mark.file_name();
    Ok(scan::list_files(source_dir, IMAGE_EXTENSIONS)?
        .into_iter()
        .filter(|p| p.file_name() != mark_name)
        .collect())
}

fn watermark_one(
    source: &Path,
    index: usize,
    output_dir: &Path,
    mark: &RgbaImage,
    config: &WatermarkConfig,
) -> Result<Staged, ImagingError> {
    let image = load_image(source)?;
    let preview = apply_watermark(&image, mark, config);
    let staged = batch::staged_path(output_dir, &config.prefix, index, "jpg");
    save_jpeg(&preview, &staged, Quality::new(config.quality), None)?;
    Ok(Staged {
        path: staged,
        extension: "jpg",
        note: None,
    })
}

#[tracing::instrument(skip_all, fields(source = %source_dir.display()))]
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    mark_path: &Path,
    config: &WatermarkConfig,
) -> Result<StageReport, StageError> {
    if !mark_path.is_file() {
        return Err(StageError::MissingFile(mark_path.to_path_buf()));
    }
    let mark = load_image(mark_path)?.to_rgba8();

    let files = watermark_inputs(source_dir, mark_path)?;
    if files.is_empty() {
        return Err(StageError::EmptyInput(source_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir)?;
    tracing::info!(count = files.len(), opacity = config.opacity, "watermarking");

    let results = batch::process_all(&files, |i, path| {
        watermark_one(path, i, output_dir, &mark, config)
    });

    let mut report = StageReport::new(StageId::Watermark);
    batch::commit(results, output_dir, &config.prefix, &mut report)?;
    Ok(report)
}
