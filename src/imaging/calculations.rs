//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Integer cross-multiplication is used wherever a rounding error would
//! change an output dimension.

use super::params::{Size, Tolerances};

/// Placement of a scaled image on a fixed-size canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Scaled image dimensions.
    pub size: Size,
    /// Top-left corner on the canvas.
    pub x: u32,
    pub y: u32,
}

/// Calculate an aspect-preserving fit of `source` inside `target`, centered.
///
/// The constrained axis matches the target exactly; the other axis is
/// rounded and never drops below one pixel.
///
/// # Examples
/// ```
/// # use clipart_press::imaging::calculations::letterbox_placement;
/// # use clipart_press::imaging::Size;
/// // 2000x1000 landscape into a 4600 square → 4600x2300, padded top and bottom
/// let p = letterbox_placement(Size::new(2000, 1000), Size::square(4600));
/// assert_eq!(p.size, Size::new(4600, 2300));
/// assert_eq!((p.x, p.y), (0, 1150));
/// ```
pub fn letterbox_placement(source: Size, target: Size) -> Placement {
    let (sw, sh) = (u64::from(source.width), u64::from(source.height));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    let size = if tw * sh <= th * sw {
        // Width is the constrained axis
        let h = (sh * tw + sw / 2) / sw;
        Size::new(target.width, (h as u32).clamp(1, target.height))
    } else {
        let w = (sw * th + sh / 2) / sh;
        Size::new((w as u32).clamp(1, target.width), target.height)
    };

    Placement {
        size,
        x: (target.width - size.width) / 2,
        y: (target.height - size.height) / 2,
    }
}

/// Uniformly scale `source` so it fits inside `bounds` on both axes.
///
/// Dimensions are truncated, so the result never overflows the bounds.
pub fn fit_within(source: Size, bounds: Size) -> Size {
    let (sw, sh) = (u64::from(source.width), u64::from(source.height));
    let (bw, bh) = (u64::from(bounds.width), u64::from(bounds.height));

    let (w, h) = if bw * sh <= bh * sw {
        // Width-limited
        (bw, sh * bw / sw)
    } else {
        (sw * bh / sh, bh)
    };
    Size::new(
        (w as u32).clamp(1, bounds.width),
        (h as u32).clamp(1, bounds.height),
    )
}

/// How close to square an image is, relative to [`Tolerances`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectTier {
    /// Within the tight band: scale straight to the crop size.
    Square,
    /// Within the loose band: scale the short axis, then center-crop.
    NearSquare,
    /// Everything else: stretch to the target, then center-crop.
    Other,
}

/// Classify `source` by its width/height ratio.
///
/// Bands are inclusive, so a ratio exactly on a boundary lands in the tighter
/// tier (19:20 is exactly 0.95 and counts as square).
pub fn classify_aspect(source: Size, tolerances: Tolerances) -> AspectTier {
    let within = |percent: u32| {
        let w = u64::from(source.width) * 100;
        let h = u64::from(source.height);
        let low = h * u64::from(100u32.saturating_sub(percent));
        let high = h * u64::from(100 + percent);
        (low..=high).contains(&w)
    };

    if within(tolerances.tight) {
        AspectTier::Square
    } else if within(tolerances.loose) {
        AspectTier::NearSquare
    } else {
        AspectTier::Other
    }
}

/// Dimensions after scaling the short axis to `short_side`, keeping aspect.
///
/// The long axis is truncated.
pub fn short_side_scaled(source: Size, short_side: u32) -> Size {
    let (w, h, short) = (
        u64::from(source.width),
        u64::from(source.height),
        u64::from(short_side),
    );
    if w > h {
        Size::new((w * short / h) as u32, short_side)
    } else {
        Size::new(short_side, (h * short / w) as u32)
    }
}

/// Top-left corner of a centered `crop` window inside `source`.
///
/// Saturates at zero when the crop is larger than the source.
pub fn center_crop_origin(source: Size, crop: Size) -> (u32, u32) {
    (
        source.width.saturating_sub(crop.width) / 2,
        source.height.saturating_sub(crop.height) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // letterbox_placement tests
    // =========================================================================

    #[test]
    fn letterbox_landscape_pads_vertically() {
        let p = letterbox_placement(Size::new(800, 600), Size::square(400));
        assert_eq!(p.size, Size::new(400, 300));
        assert_eq!((p.x, p.y), (0, 50));
    }

    #[test]
    fn letterbox_portrait_pads_horizontally() {
        let p = letterbox_placement(Size::new(600, 800), Size::square(400));
        assert_eq!(p.size, Size::new(300, 400));
        assert_eq!((p.x, p.y), (50, 0));
    }

    #[test]
    fn letterbox_square_fills_target() {
        let p = letterbox_placement(Size::square(100), Size::square(4600));
        assert_eq!(p.size, Size::square(4600));
        assert_eq!((p.x, p.y), (0, 0));
    }

    #[test]
    fn letterbox_into_non_square_target() {
        // 1000x1000 into 400x200 → height constrained
        let p = letterbox_placement(Size::square(1000), Size::new(400, 200));
        assert_eq!(p.size, Size::new(200, 200));
        assert_eq!((p.x, p.y), (100, 0));
    }

    #[test]
    fn letterbox_extreme_aspect_keeps_one_pixel() {
        let p = letterbox_placement(Size::new(10_000, 1), Size::square(100));
        assert_eq!(p.size, Size::new(100, 1));
    }

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn fit_within_shrinks_large_mark() {
        // 1000x500 mark over 400x400 source → limited by width
        assert_eq!(
            fit_within(Size::new(1000, 500), Size::square(400)),
            Size::new(400, 200)
        );
    }

    #[test]
    fn fit_within_grows_small_mark() {
        assert_eq!(
            fit_within(Size::new(100, 200), Size::square(400)),
            Size::new(200, 400)
        );
    }

    #[test]
    fn fit_within_never_overflows() {
        for (w, h) in [(333, 777), (999, 1001), (7, 3), (1, 1)] {
            let fitted = fit_within(Size::new(w, h), Size::new(640, 480));
            assert!(Size::new(640, 480).contains(fitted), "{w}x{h} → {fitted}");
        }
    }

    // =========================================================================
    // classify_aspect tests
    // =========================================================================

    fn tier(w: u32, h: u32) -> AspectTier {
        classify_aspect(Size::new(w, h), Tolerances::default())
    }

    #[test]
    fn classify_exact_square() {
        assert_eq!(tier(1000, 1000), AspectTier::Square);
    }

    #[test]
    fn classify_tight_boundaries_are_square() {
        assert_eq!(tier(950, 1000), AspectTier::Square);
        assert_eq!(tier(1050, 1000), AspectTier::Square);
        assert_eq!(tier(19, 20), AspectTier::Square);
    }

    #[test]
    fn classify_loose_band() {
        assert_eq!(tier(949, 1000), AspectTier::NearSquare);
        assert_eq!(tier(1051, 1000), AspectTier::NearSquare);
        assert_eq!(tier(900, 1000), AspectTier::NearSquare);
        assert_eq!(tier(1100, 1000), AspectTier::NearSquare);
    }

    #[test]
    fn classify_outside_bands() {
        assert_eq!(tier(899, 1000), AspectTier::Other);
        assert_eq!(tier(1101, 1000), AspectTier::Other);
        assert_eq!(tier(3000, 2000), AspectTier::Other);
    }

    // =========================================================================
    // short_side_scaled / center_crop_origin tests
    // =========================================================================

    #[test]
    fn short_side_scaled_landscape() {
        // 1080x1000 → 2592x2400
        assert_eq!(
            short_side_scaled(Size::new(1080, 1000), 2400),
            Size::new(2592, 2400)
        );
    }

    #[test]
    fn short_side_scaled_portrait() {
        assert_eq!(
            short_side_scaled(Size::new(1000, 1080), 2400),
            Size::new(2400, 2592)
        );
    }

    #[test]
    fn center_crop_origin_centers_window() {
        assert_eq!(
            center_crop_origin(Size::new(3000, 2400), Size::square(2300)),
            (350, 50)
        );
    }

    #[test]
    fn center_crop_origin_saturates() {
        assert_eq!(center_crop_origin(Size::square(100), Size::square(200)), (0, 0));
    }
}
