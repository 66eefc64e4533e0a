//! Shared test utilities for the clipart-press test suite.
//!
//! Synthetic images are written with the `image` crate so tests never depend
//! on checked-in fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_workspace(3);
//! // tmp/art-01.png … art-03.png, tmp/W1/watermark.png
//! write_solid_jpeg(&tmp.path().join("extra.jpg"), 20, 20, [255, 0, 0]);
//! ```

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Image writers
// =========================================================================

/// Solid RGBA PNG.
pub fn write_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(width, height, Rgba(rgba))
        .save(path)
        .unwrap();
}

/// Solid RGB JPEG.
pub fn write_solid_jpeg(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(width, height, Rgb(rgb)).save(path).unwrap();
}

/// DejaVu Sans Mono, checked in under `tests/fixtures/` with its license.
pub fn fixture_font_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
}

// =========================================================================
// Workspace setup
// =========================================================================

/// Working root with `count` transparent PNG exports and a watermark mark.
///
/// ```text
/// tmp/
/// ├── art-01.png … art-NN.png   # 24×16, alternating colors
/// └── W1/watermark.png          # 8×8 opaque black
/// ```
pub fn setup_workspace(count: usize) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for i in 1..=count {
        let color = if i % 2 == 0 {
            [200, 40, 40, 255]
        } else {
            [40, 40, 200, 128]
        };
        write_png(&tmp.path().join(format!("art-{i:02}.png")), 24, 16, color);
    }
    write_png(&tmp.path().join("W1/watermark.png"), 8, 8, [0, 0, 0, 255]);
    tmp
}
