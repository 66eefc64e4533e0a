//! Decoding, encoding, and crash-safe writes.
//!
//! Every deliverable is written to a hidden `.partial` sibling first and then
//! renamed over the destination, so a crash mid-write never leaves a truncated
//! file under a real name.
//!
//! | Output | Encoder | Density |
//! |---|---|---|
//! | JPEG | `image::codecs::jpeg::JpegEncoder` | JFIF `PixelDensity` (optional) |
//! | PNG (RGBA) | `png::Encoder` | `pHYs` chunk, pixels per metre |

use super::params::{Dpi, Quality, Size};
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{DynamicImage, ImageReader, RgbImage, RgbaImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode {}: {message}", .path.display())]
    Encode { path: PathBuf, message: String },
}

/// Load and decode an image from disk, sniffing the format from content.
pub fn load_image(path: &Path) -> Result<DynamicImage, ImagingError> {
    let decode_err = |message: String| ImagingError::Decode {
        path: path.to_path_buf(),
        message,
    };
    ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

pub fn image_size(image: &DynamicImage) -> Size {
    Size::new(image.width(), image.height())
}

/// Hidden sibling used while `dest` is being written.
///
/// `Upscaled/Clipart-01.png` → `Upscaled/.Clipart-01.png.partial`
pub fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.partial"))
}

/// Run `write` against a `.partial` path, then rename it onto `dest`.
///
/// Parent directories are created. On failure the partial file is removed and
/// `dest` is left untouched.
pub fn write_atomic<E, F>(dest: &Path, write: F) -> Result<(), E>
where
    E: From<std::io::Error>,
    F: FnOnce(&Path) -> Result<(), E>,
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let partial = partial_path(dest);
    if let Err(e) = write(&partial) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, dest)?;
    Ok(())
}

/// Encode an RGB raster as JPEG, optionally stamping a JFIF density.
pub fn save_jpeg(
    image: &RgbImage,
    dest: &Path,
    quality: Quality,
    dpi: Option<Dpi>,
) -> Result<(), ImagingError> {
    write_atomic(dest, |path| {
        let mut writer = BufWriter::new(File::create(path)?);
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.value());
            if let Some(dpi) = dpi {
                encoder.set_pixel_density(PixelDensity::dpi(dpi.0));
            }
            encoder
                .encode_image(image)
                .map_err(|e| ImagingError::Encode {
                    path: dest.to_path_buf(),
                    message: e.to_string(),
                })?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Encode an RGBA raster as PNG with a `pHYs` density chunk.
pub fn save_png(image: &RgbaImage, dest: &Path, dpi: Dpi) -> Result<(), ImagingError> {
    let encode_err = |e: png::EncodingError| ImagingError::Encode {
        path: dest.to_path_buf(),
        message: e.to_string(),
    };
    write_atomic(dest, |path| {
        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = png::Encoder::new(writer, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = dpi.pixels_per_meter();
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut png_writer = encoder.write_header().map_err(encode_err)?;
        png_writer
            .write_image_data(image.as_raw())
            .map_err(encode_err)?;
        png_writer.finish().map_err(encode_err)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_png, write_solid_jpeg};
    use tempfile::TempDir;

    #[test]
    fn partial_path_is_hidden_sibling() {
        let p = partial_path(Path::new("/out/Upscaled/Clipart-01.png"));
        assert_eq!(p, PathBuf::from("/out/Upscaled/.Clipart-01.png.partial"));
    }

    #[test]
    fn load_image_reads_synthetic_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.jpg");
        write_solid_jpeg(&path, 120, 80, [200, 10, 10]);

        let img = load_image(&path).unwrap();
        assert_eq!(image_size(&img), Size::new(120, 80));
    }

    #[test]
    fn load_image_garbage_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let result = load_image(&path);
        assert!(matches!(result, Err(ImagingError::Decode { .. })));
    }

    #[test]
    fn load_image_missing_file_is_decode_error() {
        let result = load_image(Path::new("/nonexistent/cover.jpg"));
        assert!(matches!(result, Err(ImagingError::Decode { .. })));
    }

    #[test]
    fn write_atomic_leaves_no_partial_on_success() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("nested/out.txt");

        write_atomic::<ImagingError, _>(&dest, |p| Ok(fs::write(p, b"done")?)).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"done");
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn write_atomic_failure_keeps_existing_dest() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.txt");
        fs::write(&dest, b"previous").unwrap();

        let result = write_atomic::<ImagingError, _>(&dest, |p| {
            fs::write(p, b"half")?;
            Err(ImagingError::Encode {
                path: p.to_path_buf(),
                message: "boom".into(),
            })
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"previous");
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn save_jpeg_writes_jfif_density() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dense.jpg");
        let img = RgbImage::from_pixel(64, 64, image::Rgb([255, 255, 255]));

        save_jpeg(&img, &dest, Quality::default(), Some(Dpi(300))).unwrap();

        let bytes = fs::read(&dest).unwrap();
        // SOI, APP0 marker, then "JFIF\0"
        assert_eq!(&bytes[0..4], &[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(&bytes[6..11], b"JFIF\0");
        // Units = dots per inch, X density = 300
        assert_eq!(bytes[13], 1);
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 300);
    }

    #[test]
    fn save_png_writes_phys_chunk() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("master.png");
        let img = RgbaImage::from_pixel(32, 16, image::Rgba([0, 0, 0, 0]));

        save_png(&img, &dest, Dpi(300)).unwrap();

        let decoder = png::Decoder::new(File::open(&dest).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (32, 16));
        let dims = info.pixel_dims.unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.unit, png::Unit::Meter);
    }

    #[test]
    fn save_png_round_trips_alpha() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.png");
        write_png(&src, 10, 10, [10, 20, 30, 40]);

        let img = load_image(&src).unwrap();
        assert!(img.color().has_alpha());
        let dest = tmp.path().join("copy.png");
        save_png(&img.to_rgba8(), &dest, Dpi::default()).unwrap();

        let back = load_image(&dest).unwrap().to_rgba8();
        assert_eq!(back.get_pixel(5, 5).0, [10, 20, 30, 40]);
    }
}
