//! Main preview collage.
//!
//! Up to `columns × rows` source images are stretched into a fixed grid on a
//! square canvas, above a solid footer band that carries centered caption
//! blocks.
//!
//! ## Default layout (2048×2048)
//!
//! ```text
//! y=0      ┌────────────────────────────────┐
//!          │        top margin (50)         │
//! y=50     ├───────┬───────┬───────┬────────┤
//!          │  0    │  1    │  2    │  3     │  cells 512×512
//!          ├───────┼───────┼───────┼────────┤
//!          │  4    │  5    │  6    │  7     │
//!          ├───────┼───────┼───────┼────────┤
//!          │  8    │  9    │  10   │  11    │
//! y=1586   ├───────┴───────┴───────┴────────┤
//! y=1648   │██████ footer band (400) ███████│
//!          │ TRANSPARENT    PNG     300 DPI │  caption area: bottom 380 px
//!          │ BACKGROUND   CLIPART 4600x4600px│
//! y=2048   └────────────────────────────────┘
//! ```
//!
//! Caption geometry is a pure function of the ink heights ([`caption_centers`]),
//! so it is tested without a font.

use crate::config::{Anchor, CaptionConfig, CollageConfig, parse_hex_color};
use crate::imaging::text::{TextStyle, draw_text_centered, ink_height, load_font};
use crate::imaging::transform::{WHITE, flatten_alpha};
use crate::imaging::{Quality, Size, load_image, save_jpeg};
use crate::scan::{self, IMAGE_EXTENSIONS};
use crate::stage::{StageError, StageId, StageReport};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use rusttype::Font;
use std::path::Path;

/// Resolved collage geometry and colors.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLayout {
    pub canvas: Size,
    pub cell: Size,
    pub columns: u32,
    pub rows: u32,
    pub top_margin: u32,
    pub footer_height: u32,
    pub caption_area_height: u32,
    pub caption_offset: i32,
    pub line_spacing: u32,
    pub background: Rgb<u8>,
    pub footer: Rgb<u8>,
    pub style: TextStyle,
    pub captions: Vec<CaptionConfig>,
}

impl CanvasLayout {
    pub fn from_config(config: &CollageConfig) -> Result<Self, StageError> {
        Ok(Self {
            canvas: config.canvas,
            cell: config.cell,
            columns: config.columns,
            rows: config.rows,
            top_margin: config.top_margin,
            footer_height: config.footer_height,
            caption_area_height: config.caption_area_height,
            caption_offset: config.caption_offset,
            line_spacing: config.line_spacing,
            background: parse_hex_color(&config.background)?,
            footer: parse_hex_color(&config.footer_color)?,
            style: TextStyle {
                fill: parse_hex_color(&config.text_color)?,
                stroke: parse_hex_color(&config.stroke_color)?,
                stroke_width: config.stroke_width,
            },
            captions: config.captions.clone(),
        })
    }

    pub fn capacity(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Top-left corner of cell `index`, filled row by row.
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        let col = index % self.columns;
        let row = index / self.columns;
        (col * self.cell.width, self.top_margin + row * self.cell.height)
    }

    pub fn footer_top(&self) -> u32 {
        self.canvas.height.saturating_sub(self.footer_height)
    }

    pub fn caption_area_top(&self) -> i32 {
        self.canvas.height as i32 - self.caption_area_height as i32
    }

    /// Horizontal center of a caption block.
    pub fn anchor_x(&self, anchor: Anchor, x_offset: i32) -> i32 {
        let half_cell = (self.cell.width / 2) as i32;
        let base = match anchor {
            Anchor::Left => half_cell,
            Anchor::Right => ((self.columns - 1) * self.cell.width) as i32 + half_cell,
            Anchor::Center => (self.canvas.width / 2) as i32,
        };
        base + x_offset
    }

    /// Vertical centers of each line of a block, given their ink heights.
    pub fn caption_centers(&self, heights: &[u32]) -> Vec<i32> {
        caption_centers(
            self.caption_area_top(),
            self.caption_area_height,
            self.caption_offset,
            self.line_spacing,
            heights,
        )
    }
}

/// Sum of line heights plus the gaps between them.
pub fn block_height(heights: &[u32], spacing: u32) -> u32 {
    let gaps = heights.len().saturating_sub(1) as u32;
    heights.iter().sum::<u32>() + spacing * gaps
}

/// Line centers for one caption block.
///
/// The block is vertically centered in the caption area and shifted by
/// `offset`; the first line's middle sits on the block top and each following
/// line moves down by the previous line's height plus `spacing`.
pub fn caption_centers(
    area_top: i32,
    area_height: u32,
    offset: i32,
    spacing: u32,
    heights: &[u32],
) -> Vec<i32> {
    let block = block_height(heights, spacing) as i32;
    let mut y = area_top + (area_height as i32 - block).div_euclid(2) + offset;
    let mut centers = Vec::with_capacity(heights.len());
    for h in heights {
        centers.push(y);
        y += *h as i32 + spacing as i32;
    }
    centers
}

/// Paint the grid, footer, and captions. `font` may be `None` only when the
/// layout has no captions.
pub fn compose(
    images: &[DynamicImage],
    layout: &CanvasLayout,
    font: Option<&Font<'_>>,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(layout.canvas.width, layout.canvas.height, layout.background);

    for (i, image) in images.iter().take(layout.capacity()).enumerate() {
        let flat = flatten_alpha(image, WHITE);
        let cell = imageops::resize(&flat, layout.cell.width, layout.cell.height, FilterType::Lanczos3);
        let (x, y) = layout.cell_origin(i);
        imageops::replace(&mut canvas, &cell, i64::from(x), i64::from(y));
    }

    let footer_top = layout.footer_top();
    for y in footer_top..layout.canvas.height {
        for x in 0..layout.canvas.width {
            canvas.put_pixel(x, y, layout.footer);
        }
    }

    if let Some(font) = font {
        for block in &layout.captions {
            let heights: Vec<u32> = block
                .lines
                .iter()
                .map(|line| ink_height(font, line, block.font_size))
                .collect();
            let x = layout.anchor_x(block.anchor, block.x_offset);
            for (line, y) in block.lines.iter().zip(layout.caption_centers(&heights)) {
                draw_text_centered(&mut canvas, font, line, block.font_size, (x, y), &layout.style);
            }
        }
    }
    canvas
}

/// Build the collage from `source_dir` into `output_dir`.
#[tracing::instrument(skip_all, fields(source = %source_dir.display()))]
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    config: &CollageConfig,
    font_path: &Path,
) -> Result<StageReport, StageError> {
    let layout = CanvasLayout::from_config(config)?;
    let files = scan::list_files(source_dir, IMAGE_EXTENSIONS)?;
    if files.is_empty() {
        return Err(StageError::EmptyInput(source_dir.to_path_buf()));
    }
    let font = if layout.captions.is_empty() {
        None
    } else {
        Some(load_font(font_path)?)
    };

    let mut report = StageReport::new(StageId::Collage);
    let mut images = Vec::with_capacity(layout.capacity());
    for path in files.iter().take(layout.capacity()) {
        match load_image(path) {
            Ok(image) => images.push(image),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipped");
                report.skip(path, e);
            }
        }
    }
    if images.is_empty() {
        return Err(StageError::EmptyInput(source_dir.to_path_buf()));
    }
    if files.len() > layout.capacity() {
        tracing::debug!(ignored = files.len() - layout.capacity(), "beyond collage capacity");
    }

    let canvas = compose(&images, &layout, font.as_ref());
    let dest = output_dir.join(&config.output_name);
    save_jpeg(&canvas, &dest, Quality::new(config.quality), None)?;
    tracing::info!(images = images.len(), output = %dest.display(), "collage written");

    report.processed = images.len();
    report.outputs.push(dest);
    Ok(report)
}
