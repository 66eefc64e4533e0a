//! Print-resolution masters.
//!
//! Every eligible source image becomes a square master at the configured size
//! (4600×4600 by default), numbered `Clipart-01`, `Clipart-02`, … in sorted
//! input order.
//!
//! | Source | Canvas | Post-processing | Output |
//! |---|---|---|---|
//! | has alpha | stretched to the frame | PNG optimizer (best effort) | PNG + `pHYs` 300 DPI |
//! | opaque | white | 3×3 sharpen | JPEG q95 + JFIF 300 DPI |
//!
//! Transparent masters can be letterboxed onto a transparent canvas instead
//! with `alpha_fit = "letterbox"`.
//!
//! The optimizer runs into a separate staged file; the unoptimized PNG is
//! kept whenever it fails or is missing.

use crate::batch::{self, Staged};
use crate::config::{AlphaFit, UpscaleConfig};
use crate::imaging::transform::{
    TRANSPARENT, resize_letterbox, resize_letterbox_with, resize_stretch, sharpen,
};
use crate::imaging::{ImagingError, SHARPEN_KERNEL, load_image, save_jpeg, save_png};
use crate::scan::{self, IMAGE_EXTENSIONS};
use crate::stage::{StageError, StageId, StageReport};
use crate::tools::PngOptimizer;
use std::fs;
use std::path::Path;

/// Upscale one file to a staged output in `output_dir`.
pub fn upscale_one(
    source: &Path,
    index: usize,
    output_dir: &Path,
    config: &UpscaleConfig,
    optimizer: &dyn PngOptimizer,
) -> Result<Staged, ImagingError> {
    let image = load_image(source)?;

    if image.color().has_alpha() {
        let master = match config.alpha_fit {
            AlphaFit::Stretch => resize_stretch(&image, config.size),
            AlphaFit::Letterbox => resize_letterbox_with(&image, config.size, TRANSPARENT),
        };
        let staged = batch::staged_path(output_dir, &config.prefix, index, "png");
        save_png(&master, &staged, config.density())?;

        let note = if config.optimize {
            optimize_in_place(&staged, optimizer)
        } else {
            None
        };
        Ok(Staged {
            path: staged,
            extension: "png",
            note,
        })
    } else {
        let mut master = resize_letterbox(&image, config.size);
        if config.sharpen {
            master = sharpen(&master, &SHARPEN_KERNEL);
        }
        let staged = batch::staged_path(output_dir, &config.prefix, index, "jpg");
        save_jpeg(&master, &staged, config.jpeg_quality(), Some(config.density()))?;
        Ok(Staged {
            path: staged,
            extension: "jpg",
            note: None,
        })
    }
}

/// Best-effort optimizer pass; returns a note when the original was kept.
fn optimize_in_place(png: &Path, optimizer: &dyn PngOptimizer) -> Option<String> {
    let optimized = png.with_extension("opt.png");
    let outcome = optimizer
        .optimize(png, &optimized)
        .map_err(|e| e.to_string())
        .and_then(|()| fs::rename(&optimized, png).map_err(|e| e.to_string()));

    match outcome {
        Ok(()) => None,
        Err(message) => {
            let _ = fs::remove_file(&optimized);
            tracing::warn!(file = %png.display(), error = %message, "PNG optimizer failed, keeping unoptimized master");
            Some(format!("optimizer skipped: {message}"))
        }
    }
}

/// Upscale every eligible image in `source_dir` into `output_dir`.
#[tracing::instrument(skip_all, fields(source = %source_dir.display()))]
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    config: &UpscaleConfig,
    optimizer: &dyn PngOptimizer,
) -> Result<StageReport, StageError> {
    let files = scan::list_files(source_dir, IMAGE_EXTENSIONS)?;
    if files.is_empty() {
        return Err(StageError::EmptyInput(source_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir)?;
    tracing::info!(count = files.len(), size = %config.size, "upscaling");

    let results = batch::process_all(&files, |i, path| {
        upscale_one(path, i, output_dir, config, optimizer)
    });

    let mut report = StageReport::new(StageId::Upscale);
    batch::commit(results, output_dir, &config.prefix, &mut report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Size;
    use crate::test_helpers::{write_png, write_solid_jpeg};
    use crate::tools::tests::MockOptimizer;
    use tempfile::TempDir;

    fn small_config() -> UpscaleConfig {
        UpscaleConfig {
            size: Size::square(64),
            ..UpscaleConfig::default()
        }
    }

    fn names(report: &StageReport) -> Vec<String> {
        report.outputs.iter().map(|p| scan::file_name_string(p)).collect()
    }

    // =========================================================================
    // Per-file treatment
    // =========================================================================

    #[test]
    fn alpha_source_becomes_transparent_png() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("art.png");
        write_png(&src, 40, 20, [200, 0, 0, 255]);
        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();

        let staged = upscale_one(&src, 0, &out, &small_config(), &MockOptimizer::default()).unwrap();
        assert_eq!(staged.extension, "png");

        let img = image::open(&staged.path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (64, 64));
        // stretched: no transparent bands at the top or bottom
        assert_eq!(img.get_pixel(32, 0)[3], 255);
        assert_eq!(img.get_pixel(32, 63)[3], 255);
        assert_eq!(img.get_pixel(32, 32)[3], 255);
    }

    #[test]
    fn letterbox_fit_keeps_transparent_bands() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("art.png");
        write_png(&src, 40, 20, [200, 0, 0, 255]);
        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();
        let config = UpscaleConfig {
            alpha_fit: AlphaFit::Letterbox,
            ..small_config()
        };

        let staged = upscale_one(&src, 0, &out, &config, &MockOptimizer::default()).unwrap();
        let img = image::open(&staged.path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (64, 64));
        assert_eq!(img.get_pixel(32, 0)[3], 0);
        assert_eq!(img.get_pixel(32, 32)[3], 255);
    }

    #[test]
    fn opaque_source_becomes_jpeg() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("art.jpg");
        write_solid_jpeg(&src, 30, 30, [0, 0, 200]);
        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();

        let staged = upscale_one(&src, 0, &out, &small_config(), &MockOptimizer::default()).unwrap();
        assert_eq!(staged.extension, "jpg");
        let img = image::open(&staged.path).unwrap();
        assert_eq!((img.width(), img.height()), (64, 64));
    }

    #[test]
    fn optimizer_called_only_for_alpha_masters() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 10, 10, [1, 2, 3, 128]);
        write_solid_jpeg(&tmp.path().join("b.jpg"), 10, 10, [1, 2, 3]);
        let out = tmp.path().join("Upscaled");
        let mock = MockOptimizer::default();

        run(tmp.path(), &out, &small_config(), &mock).unwrap();
        assert_eq!(mock.get_calls().len(), 1);
    }

    #[test]
    fn optimizer_failure_keeps_master_and_notes_it() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 10, 10, [1, 2, 3, 128]);
        let out = tmp.path().join("Upscaled");

        let report = run(tmp.path(), &out, &small_config(), &MockOptimizer::failing()).unwrap();
        assert_eq!(names(&report), vec!["Clipart-01.png"]);
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("quality too low"));
        assert!(image::open(out.join("Clipart-01.png")).is_ok());
    }

    #[test]
    fn optimize_disabled_skips_optimizer() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 10, 10, [1, 2, 3, 128]);
        let mock = MockOptimizer::default();
        let config = UpscaleConfig {
            optimize: false,
            ..small_config()
        };
        run(tmp.path(), &tmp.path().join("Upscaled"), &config, &mock).unwrap();
        assert!(mock.get_calls().is_empty());
    }

    // =========================================================================
    // Batch behaviour
    // =========================================================================

    #[test]
    fn outputs_numbered_in_sorted_order_skipping_failures() {
        let tmp = TempDir::new().unwrap();
        write_solid_jpeg(&tmp.path().join("c.jpg"), 10, 10, [0, 0, 0]);
        write_png(&tmp.path().join("a.png"), 10, 10, [0, 0, 0, 255]);
        fs::write(tmp.path().join("b.png"), b"not an image").unwrap();
        let out = tmp.path().join("Upscaled");

        let report = run(tmp.path(), &out, &small_config(), &MockOptimizer::default()).unwrap();
        assert_eq!(names(&report), vec!["Clipart-01.png", "Clipart-02.jpg"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("b.png"));
    }

    #[test]
    fn rerun_converges_on_same_outputs() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 12, 8, [9, 9, 9, 255]);
        write_solid_jpeg(&tmp.path().join("b.jpg"), 8, 12, [9, 9, 9]);
        let out = tmp.path().join("Upscaled");
        let mock = MockOptimizer::default();

        run(tmp.path(), &out, &small_config(), &mock).unwrap();
        let first = scan::list_files(&out, IMAGE_EXTENSIONS).unwrap();
        run(tmp.path(), &out, &small_config(), &mock).unwrap();
        let second = scan::list_files(&out, IMAGE_EXTENSIONS).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn upscaling_own_output_is_harmless() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 12, 8, [9, 9, 9, 255]);
        let out = tmp.path().join("Upscaled");
        let mock = MockOptimizer::default();

        run(tmp.path(), &out, &small_config(), &mock).unwrap();
        let report = run(&out, &out, &small_config(), &mock).unwrap();

        assert_eq!(names(&report), vec!["Clipart-01.png"]);
        let img = image::open(out.join("Clipart-01.png")).unwrap();
        assert_eq!((img.width(), img.height()), (64, 64));
    }

    #[test]
    fn empty_source_is_empty_input() {
        let tmp = TempDir::new().unwrap();
        let result = run(tmp.path(), &tmp.path().join("Upscaled"), &small_config(), &MockOptimizer::default());
        assert!(matches!(result, Err(StageError::EmptyInput(_))));
    }

    #[test]
    fn all_failures_still_report() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.jpg"), b"junk").unwrap();
        let report = run(tmp.path(), &tmp.path().join("Upscaled"), &small_config(), &MockOptimizer::default())
            .unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped.len(), 1);
    }
}
