//! Geometry transforms: letterbox, stretch-and-crop, aspect-aware crop, alpha
//! flattening, sharpening, opacity.
//!
//! Every function takes a borrowed raster and returns a new one. Dimension
//! math lives in [`calculations`](super::calculations); this module only moves
//! pixels.

use super::calculations::{
    AspectTier, center_crop_origin, classify_aspect, letterbox_placement, short_side_scaled,
};
use super::codec::image_size;
use super::params::{Size, Tolerances};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

const FILTER: FilterType = FilterType::Lanczos3;

fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

/// Composite an image onto an opaque background.
///
/// Alpha-free images are converted to RGB unchanged.
pub fn flatten_alpha(image: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = u16::from(src[3]);
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255(u16::from(src[c]), a) + mul_div255(u16::from(background[c]), inv);
            dst[c] = v.min(255) as u8;
        }
    }
    out
}

/// Aspect-preserving fit onto a white canvas of exactly `target`.
pub fn resize_letterbox(image: &DynamicImage, target: Size) -> RgbImage {
    let flat = flatten_alpha(image, WHITE);
    let placement = letterbox_placement(image_size(image), target);
    let scaled = imageops::resize(&flat, placement.size.width, placement.size.height, FILTER);

    let mut canvas = RgbImage::from_pixel(target.width, target.height, WHITE);
    imageops::replace(
        &mut canvas,
        &scaled,
        i64::from(placement.x),
        i64::from(placement.y),
    );
    canvas
}

/// Like [`resize_letterbox`] but keeps alpha, padding with `background`.
pub fn resize_letterbox_with(image: &DynamicImage, target: Size, background: Rgba<u8>) -> RgbaImage {
    let rgba = image.to_rgba8();
    let placement = letterbox_placement(image_size(image), target);
    let scaled = imageops::resize(&rgba, placement.size.width, placement.size.height, FILTER);

    let mut canvas = RgbaImage::from_pixel(target.width, target.height, background);
    imageops::replace(
        &mut canvas,
        &scaled,
        i64::from(placement.x),
        i64::from(placement.y),
    );
    canvas
}

/// Resample to exactly `target`, keeping alpha. Aspect ratio is not preserved.
pub fn resize_stretch(image: &DynamicImage, target: Size) -> RgbaImage {
    imageops::resize(&image.to_rgba8(), target.width, target.height, FILTER)
}

fn crop_centered(image: &RgbImage, crop: Size) -> RgbImage {
    let (x, y) = center_crop_origin(Size::new(image.width(), image.height()), crop);
    imageops::crop_imm(image, x, y, crop.width, crop.height).to_image()
}

/// Stretch to `resize` (aspect not preserved), then take the centered `crop`.
pub fn resize_crop_centered(image: &DynamicImage, resize: Size, crop: Size) -> RgbImage {
    let flat = flatten_alpha(image, WHITE);
    let stretched = imageops::resize(&flat, resize.width, resize.height, FILTER);
    crop_centered(&stretched, crop)
}

/// Normalize any aspect ratio to exactly `crop`.
///
/// | Tier | Treatment |
/// |---|---|
/// | Square (within `tolerances.tight`) | scale straight to `crop` |
/// | Near-square (within `tolerances.loose`) | short side → `intermediate`, center-crop |
/// | Other | stretch to `target`, center-crop |
pub fn resize_and_crop_aspect_aware(
    image: &DynamicImage,
    target: Size,
    crop: Size,
    intermediate: u32,
    tolerances: Tolerances,
) -> RgbImage {
    let source = image_size(image);
    match classify_aspect(source, tolerances) {
        AspectTier::Square => {
            let flat = flatten_alpha(image, WHITE);
            imageops::resize(&flat, crop.width, crop.height, FILTER)
        }
        AspectTier::NearSquare => {
            let flat = flatten_alpha(image, WHITE);
            let scaled = short_side_scaled(source, intermediate);
            let resized = imageops::resize(&flat, scaled.width, scaled.height, FILTER);
            crop_centered(&resized, crop)
        }
        AspectTier::Other => resize_crop_centered(image, target, crop),
    }
}

/// 3×3 convolution, normalized by the kernel sum.
///
/// Border pixels sample their clamped neighbours, so the output has no dark
/// frame (unlike `imageops::filter3x3`).
pub fn sharpen(image: &RgbImage, kernel: &[f32; 9]) -> RgbImage {
    let (w, h) = image.dimensions();
    let sum: f32 = kernel.iter().sum();
    let norm = if sum == 0.0 { 1.0 } else { sum };
    let max_x = i64::from(w) - 1;
    let max_y = i64::from(h) - 1;

    RgbImage::from_fn(w, h, |x, y| {
        let mut acc = [0f32; 3];
        for (k, weight) in kernel.iter().enumerate() {
            let sx = (i64::from(x) + (k % 3) as i64 - 1).clamp(0, max_x) as u32;
            let sy = (i64::from(y) + (k / 3) as i64 - 1).clamp(0, max_y) as u32;
            let px = image.get_pixel(sx, sy);
            for (a, c) in acc.iter_mut().zip(px.0) {
                *a += weight * f32::from(c);
            }
        }
        Rgb(acc.map(|v| (v / norm).round().clamp(0.0, 255.0) as u8))
    })
}

/// Scale every pixel's alpha by `factor` (clamped to `0.0..=1.0`).
pub fn reduce_opacity(mut image: RgbaImage, factor: f32) -> RgbaImage {
    let factor = factor.clamp(0.0, 1.0);
    for px in image.pixels_mut() {
        px[3] = (f32::from(px[3]) * factor).round() as u8;
    }
    image
}

/// Alpha-blend `top` over the center of `base`.
pub fn overlay_centered(base: &mut RgbaImage, top: &RgbaImage) {
    let x = (i64::from(base.width()) - i64::from(top.width())) / 2;
    let y = (i64::from(base.height()) - i64::from(top.height())) / 2;
    imageops::overlay(base, top, x, y);
}
