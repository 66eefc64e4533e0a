//! Caption rendering with `rusttype`.
//!
//! Text is positioned by its ink bounds: [`ink_height`] measures the painted
//! rows of a line, and [`draw_text_centered`] puts the middle of the painted
//! box on the requested point. An optional outline is drawn first by stamping
//! the glyph coverage at every offset within the stroke radius.

use image::{Rgb, RgbImage};
use rusttype::{Font, PositionedGlyph, Rect, Scale, point};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to read font {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a usable TrueType/OpenType font: {}", .0.display())]
    InvalidFont(PathBuf),
}

/// Fill and outline colors for a caption line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub fill: Rgb<u8>,
    pub stroke: Rgb<u8>,
    /// Outline radius in pixels; 0 disables the outline.
    pub stroke_width: u32,
}

pub fn load_font(path: &Path) -> Result<Font<'static>, TextError> {
    let bytes = fs::read(path).map_err(|source| TextError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| TextError::InvalidFont(path.to_path_buf()))
}

fn layout<'f>(font: &'f Font<'f>, text: &str, px: f32) -> Vec<PositionedGlyph<'f>> {
    let scale = Scale::uniform(px);
    let ascent = font.v_metrics(scale).ascent;
    font.layout(text, scale, point(0.0, ascent)).collect()
}

/// Union of the glyphs' pixel bounding boxes. `None` for whitespace-only text.
fn ink_bounds(glyphs: &[PositionedGlyph<'_>]) -> Option<Rect<i32>> {
    glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        })
}

/// Height in pixels of the painted rows of `text` at `px` size.
pub fn ink_height(font: &Font<'_>, text: &str, px: f32) -> u32 {
    ink_bounds(&layout(font, text, px))
        .map(|r| (r.max.y - r.min.y).max(0) as u32)
        .unwrap_or(0)
}

/// Linear blend of `color` over `pixel` by glyph coverage.
fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    for c in 0..3 {
        let v = f32::from(pixel[c]) * (1.0 - a) + f32::from(color[c]) * a;
        pixel[c] = v.round() as u8;
    }
}

fn paint(canvas: &mut RgbImage, glyphs: &[PositionedGlyph<'_>], dx: i32, dy: i32, color: Rgb<u8>) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let x = dx + bb.min.x + gx as i32;
                let y = dy + bb.min.y + gy as i32;
                if x < 0 || y < 0 || x >= w || y >= h {
                    return;
                }
                blend(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
            });
        }
    }
}

/// Width of the laid-out line measured by glyph advances.
fn advance_width(glyphs: &[PositionedGlyph<'_>]) -> f32 {
    glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Draw one line with the middle of its line box at `center`.
///
/// The box spans the advance width horizontally and ascent to descent
/// vertically, so a descender does not move the line up.
pub fn draw_text_centered(
    canvas: &mut RgbImage,
    font: &Font<'_>,
    text: &str,
    px: f32,
    center: (i32, i32),
    style: &TextStyle,
) {
    let glyphs = layout(font, text, px);
    if ink_bounds(&glyphs).is_none() {
        return;
    }
    let v = font.v_metrics(Scale::uniform(px));
    let ox = center.0 - (advance_width(&glyphs) / 2.0).round() as i32;
    let oy = center.1 - ((v.ascent - v.descent) / 2.0).round() as i32;

    let r = style.stroke_width as i32;
    if r > 0 {
        for sy in -r..=r {
            for sx in -r..=r {
                if sx * sx + sy * sy <= r * r {
                    paint(canvas, &glyphs, ox + sx, oy + sy, style.stroke);
                }
            }
        }
    }
    paint(canvas, &glyphs, ox, oy, style.fill);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fixture_font_path;
    use tempfile::TempDir;

    #[test]
    fn blend_full_coverage_replaces() {
        let mut px = Rgb([255, 255, 255]);
        blend(&mut px, Rgb([0, 0, 0]), 1.0);
        assert_eq!(px.0, [0, 0, 0]);
    }

    #[test]
    fn blend_zero_coverage_keeps() {
        let mut px = Rgb([10, 20, 30]);
        blend(&mut px, Rgb([200, 200, 200]), 0.0);
        assert_eq!(px.0, [10, 20, 30]);
    }

    #[test]
    fn load_font_missing_file() {
        let result = load_font(Path::new("/nonexistent/font.otf"));
        assert!(matches!(result, Err(TextError::Io { .. })));
    }

    #[test]
    fn load_font_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.ttf");
        fs::write(&path, b"not a font at all").unwrap();
        assert!(matches!(load_font(&path), Err(TextError::InvalidFont(_))));
    }

    fn top_dark_row(canvas: &RgbImage) -> Option<u32> {
        (0..canvas.height()).find(|&y| (0..canvas.width()).any(|x| canvas.get_pixel(x, y)[0] < 128))
    }

    #[test]
    fn draw_text_paints_around_center() {
        let font = load_font(&fixture_font_path()).unwrap();

        assert!(ink_height(&font, "PNG", 80.0) > 30);
        assert_eq!(ink_height(&font, "   ", 80.0), 0);

        let mut canvas = RgbImage::from_pixel(400, 200, Rgb([255, 255, 255]));
        let style = TextStyle {
            fill: Rgb([0, 0, 0]),
            stroke: Rgb([0, 0, 0]),
            stroke_width: 1,
        };
        draw_text_centered(&mut canvas, &font, "H", 100.0, (200, 100), &style);

        let dark = canvas.pixels().filter(|p| p[0] < 128).count();
        assert!(dark > 100);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(399, 199).0, [255, 255, 255]);
    }

    #[test]
    fn descenders_do_not_lift_the_line() {
        let font = load_font(&fixture_font_path()).unwrap();
        let style = TextStyle {
            fill: Rgb([0, 0, 0]),
            stroke: Rgb([0, 0, 0]),
            stroke_width: 0,
        };
        let draw = |text: &str| {
            let mut canvas = RgbImage::from_pixel(400, 200, Rgb([255, 255, 255]));
            draw_text_centered(&mut canvas, &font, text, 80.0, (200, 100), &style);
            canvas
        };

        let plain = top_dark_row(&draw("HH")).unwrap();
        let with_descender = top_dark_row(&draw("Hg")).unwrap();
        assert_eq!(plain, with_descender);
    }

    #[test]
    fn line_box_middle_sits_on_center() {
        let font = load_font(&fixture_font_path()).unwrap();
        let v = font.v_metrics(Scale::uniform(80.0));
        let mut canvas = RgbImage::from_pixel(400, 200, Rgb([255, 255, 255]));
        let style = TextStyle {
            fill: Rgb([0, 0, 0]),
            stroke: Rgb([0, 0, 0]),
            stroke_width: 0,
        };
        draw_text_centered(&mut canvas, &font, "H", 80.0, (200, 100), &style);

        // cap top sits below the line box top (ascent covers accents)
        let box_top = 100 - ((v.ascent - v.descent) / 2.0).round() as i32;
        let top = top_dark_row(&canvas).unwrap() as i32;
        assert!(top > box_top, "{top} vs {box_top}");
        assert!(top < 100);
    }
}
