//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. Stage modules
//! build them from config and hand them to the transforms in
//! [`transform`](super::transform) and the writers in [`codec`](super::codec).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`Size`]: Width × height of an output raster.
//! - [`Dpi`]: Print density stored in JPEG JFIF headers and PNG `pHYs` chunks.
//! - [`Tolerances`]: Square-ness bands used by the aspect-aware crop.
//! - [`SHARPEN_KERNEL`]: The fixed 3×3 sharpening convolution for opaque masters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Pixel dimensions of an output raster.
///
/// Serialized as a `[width, height]` pair so config files stay compact:
///
/// ```toml
/// size = [4600, 4600]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when both sides are at least as large as `other`'s.
    pub fn contains(self, other: Size) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(size: Size) -> Self {
        [size.width, size.height]
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Print density in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dpi(pub u16);

impl Dpi {
    /// PNG stores density as pixels per metre.
    pub fn pixels_per_meter(self) -> u32 {
        (f64::from(self.0) / 0.0254).round() as u32
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self(300)
    }
}

/// Square-ness tolerance bands, in percent of the height.
///
/// An image whose `width / height` ratio lies within `tight` percent of 1 is
/// treated as square; within `loose` percent as near-square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tolerances {
    pub tight: u32,
    pub loose: u32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tight: 5, loose: 10 }
    }
}

/// Fixed 3×3 sharpening kernel applied to opaque masters after resampling.
///
/// Row-major; sums to 1 so overall brightness is preserved.
pub const SHARPEN_KERNEL: [f32; 9] = [0.0, -0.5, 0.0, -0.5, 3.0, -0.5, 0.0, -0.5, 0.0];
