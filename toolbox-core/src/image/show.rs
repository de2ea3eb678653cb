//! Terminal image preview using upper-half-block cells.
//!
//! Each character cell shows two vertically stacked pixels: the
//! foreground color paints the top half (`▀`) and the background color
//! paints the bottom half.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::error::{Result, ToolboxError};

/// Column count used when none is configured.
pub const DEFAULT_WIDTH: u32 = 80;

/// One character cell: top and bottom pixel colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfBlock {
    pub top: [u8; 3],
    pub bottom: [u8; 3],
}

/// A grid of half-block cells ready to print row by row.
#[derive(Debug, Clone)]
pub struct HalfBlockGrid {
    pub title: String,
    /// Source image size in pixels.
    pub source_width: u32,
    pub source_height: u32,
    pub rows: Vec<Vec<HalfBlock>>,
}

impl HalfBlockGrid {
    pub fn columns(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

/// Downscale `img` to at most `max_columns` wide, keeping its aspect ratio.
pub fn fit_width(img: &DynamicImage, max_columns: u32) -> RgbImage {
    let columns = max_columns.max(1).min(img.width().max(1));
    if columns == img.width() {
        return img.to_rgb8();
    }
    let scale = columns as f64 / img.width().max(1) as f64;
    let rows = ((img.height() as f64 * scale).round() as u32).max(1);
    img.resize_exact(columns, rows, FilterType::Triangle).to_rgb8()
}

/// Build the cell grid for `img`.
pub fn grid(img: &DynamicImage, max_columns: u32, title: &str) -> HalfBlockGrid {
    let scaled = fit_width(img, max_columns);
    let (width, height) = scaled.dimensions();

    let mut rows = Vec::with_capacity(height.div_ceil(2) as usize);
    for y in (0..height).step_by(2) {
        let row = (0..width)
            .map(|x| {
                let top = scaled.get_pixel(x, y).0;
                // An odd final row pads its bottom half with black.
                let bottom = if y + 1 < height {
                    scaled.get_pixel(x, y + 1).0
                } else {
                    [0, 0, 0]
                };
                HalfBlock { top, bottom }
            })
            .collect();
        rows.push(row);
    }

    HalfBlockGrid {
        title: title.to_string(),
        source_width: img.width(),
        source_height: img.height(),
        rows,
    }
}

/// Load an image file and build its cell grid.
pub fn load(file_path: &Path, max_columns: u32) -> Result<HalfBlockGrid> {
    if !file_path.is_file() {
        return Err(ToolboxError::NotFound(file_path.display().to_string()));
    }
    let img = image::open(file_path)?;
    let title = std::path::absolute(file_path)?.display().to_string();
    Ok(grid(&img, max_columns, &title))
}
