//! Image processing: pure Rust decode/encode plus geometry transforms.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Resize** | `image::imageops::resize`, Lanczos3 |
//! | **Encode JPEG** | `image::codecs::jpeg::JpegEncoder` + JFIF density |
//! | **Encode PNG** | `png::Encoder` + `pHYs` chunk |
//! | **Captions** | `rusttype` glyph rasterization |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Transform**: Raster-in, raster-out geometry and pixel operations
//! - **Codec**: Loading, saving, and atomic writes
//! - **Text**: Font loading and centered caption drawing

pub mod calculations;
pub mod codec;
mod params;
pub mod text;
pub mod transform;

pub use codec::{ImagingError, load_image, save_jpeg, save_png, write_atomic};
pub use params::{Dpi, Quality, SHARPEN_KERNEL, Size, Tolerances};
