//! Tiled debug rendering of box arrays
//!
//! Each slot becomes one framed tile the size of the array extent with the
//! slot's box outlined inside it, so size outliers stand out when tiles are
//! viewed side by side.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;
use thiserror::Error;

use crate::boxa::{BoxArray, BoxError};

/// Outline colour for boxes
const BOX_COLOR: Rgb<u8> = Rgb([220, 30, 30]);

/// Tile frame colour
const FRAME_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Refuse to allocate canvases larger than this many pixels
const MAX_CANVAS_PIXELS: u64 = 200_000_000;

/// Error type for tiled rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Box array error: {0}")]
    Box(#[from] BoxError),

    #[error("Invalid render options: {0}")]
    InvalidOptions(String),

    #[error("Canvas too large: {width}x{height}")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Options for tiled rendering
#[derive(Debug, Clone, PartialEq)]
pub struct TileOptions {
    /// Maximum canvas width before wrapping to a new row (default: 2200)
    pub max_width: u32,
    /// Box outline thickness (default: 2)
    pub line_width: u32,
    /// Scale applied to box coordinates (default: 1.0)
    pub scale: f32,
    /// Background grey level (default: 255)
    pub background: u8,
    /// Gap between tiles (default: 3)
    pub spacing: u32,
    /// Tile frame thickness (default: 2)
    pub border: u32,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            max_width: 2200,
            line_width: 2,
            scale: 1.0,
            background: 255,
            spacing: 3,
            border: 2,
        }
    }
}

impl TileOptions {
    fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RenderError::InvalidOptions(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.max_width == 0 {
            return Err(RenderError::InvalidOptions("max_width must be > 0".into()));
        }
        Ok(())
    }
}

/// Render every slot as a framed tile
pub fn render_tiled(boxes: &BoxArray, options: &TileOptions) -> Result<RgbImage> {
    options.validate()?;
    let (ext_w, ext_h) = boxes.extent()?;
    let scale = options.scale as f64;
    let border = options.border;
    let spacing = options.spacing;

    let inner = |v: i64| ((v.max(1) as f64 * scale).ceil() as u64).max(1);
    let tile_w = inner(ext_w) + 2 * border as u64;
    let tile_h = inner(ext_h) + 2 * border as u64;

    let n = boxes.len() as u64;
    let per_row = ((options.max_width as u64).saturating_sub(spacing as u64) / (tile_w + spacing as u64))
        .clamp(1, n.max(1));
    let rows = n.div_ceil(per_row);

    let canvas_w = spacing as u64 + per_row * (tile_w + spacing as u64);
    let canvas_h = spacing as u64 + rows * (tile_h + spacing as u64);
    if canvas_w * canvas_h > MAX_CANVAS_PIXELS {
        return Err(RenderError::CanvasTooLarge {
            width: canvas_w,
            height: canvas_h,
        });
    }

    let bg = options.background;
    let mut canvas = RgbImage::from_pixel(canvas_w as u32, canvas_h as u32, Rgb([bg, bg, bg]));

    for (i, slot) in boxes.slots().iter().enumerate() {
        let (col, row) = (i as u64 % per_row, i as u64 / per_row);
        let ox = (spacing as u64 + col * (tile_w + spacing as u64)) as i32;
        let oy = (spacing as u64 + row * (tile_h + spacing as u64)) as i32;

        draw_outline(&mut canvas, ox, oy, tile_w as u32, tile_h as u32, border, FRAME_COLOR);

        if let Some(b) = slot.as_box() {
            let left = ox + border as i32 + (b.x() as f64 * scale).round() as i32;
            let top = oy + border as i32 + (b.y() as f64 * scale).round() as i32;
            let w = ((b.width() as f64 * scale).round() as u32).max(1);
            let h = ((b.height() as f64 * scale).round() as u32).max(1);
            draw_outline(&mut canvas, left, top, w, h, options.line_width.max(1), BOX_COLOR);
        }
    }

    Ok(canvas)
}

/// Render and save as PNG
pub fn save_tiled_png(boxes: &BoxArray, options: &TileOptions, path: &Path) -> Result<()> {
    let canvas = render_tiled(boxes, options)?;
    canvas.save(path)?;
    Ok(())
}

/// Nested hollow rectangles, `thickness` pixels deep
fn draw_outline(canvas: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, thickness: u32, color: Rgb<u8>) {
    for k in 0..thickness {
        if w <= 2 * k || h <= 2 * k {
            break;
        }
        let rect = Rect::at(x + k as i32, y + k as i32).of_size(w - 2 * k, h - 2 * k);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxa::{BoundingBox, BoxSlot};

    fn sample() -> BoxArray {
        BoxArray::new(vec![
            BoxSlot::valid(BoundingBox::new(0, 0, 40, 20)),
            BoxSlot::Missing,
            BoxSlot::valid(BoundingBox::new(10, 5, 30, 15)),
        ])
    }

    #[test]
    fn test_tile_options_default() {
        let opts = TileOptions::default();
        assert_eq!(opts.max_width, 2200);
        assert_eq!(opts.line_width, 2);
        assert!((opts.scale - 1.0).abs() < f32::EPSILON);
        assert_eq!(opts.spacing, 3);
        assert_eq!(opts.border, 2);
    }

    #[test]
    fn test_render_single_row() {
        let img = render_tiled(&sample(), &TileOptions::default()).unwrap();
        // extent 40x20, border 2 -> tile 44x24; 3 tiles + 4 gaps
        assert_eq!(img.width(), 3 + 3 * (44 + 3));
        assert_eq!(img.height(), 3 + 24 + 3);
        // frame corner of first tile
        assert_eq!(*img.get_pixel(3, 3), FRAME_COLOR);
        // box outline in the first tile
        assert_eq!(*img.get_pixel(5, 5), BOX_COLOR);
        // missing slot tile interior stays background
        assert_eq!(*img.get_pixel(3 + 47 + 10, 3 + 10), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_render_wraps_rows() {
        let opts = TileOptions {
            max_width: 100,
            ..Default::default()
        };
        let img = render_tiled(&sample(), &opts).unwrap();
        // (100 - 3) / 47 = 2 tiles per row, 2 rows
        assert_eq!(img.width(), 3 + 2 * 47);
        assert_eq!(img.height(), 3 + 2 * 27);
    }

    #[test]
    fn test_render_scale() {
        let opts = TileOptions {
            scale: 0.5,
            ..Default::default()
        };
        let img = render_tiled(&sample(), &opts).unwrap();
        assert_eq!(img.height(), 3 + (10 + 4) + 3);
    }

    #[test]
    fn test_render_empty_is_error() {
        let err = render_tiled(&BoxArray::with_missing(2), &TileOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::Box(BoxError::EmptyInput)));
    }

    #[test]
    fn test_render_invalid_options() {
        let opts = TileOptions {
            scale: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            render_tiled(&sample(), &opts),
            Err(RenderError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_save_png() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("tiles.png");
        save_tiled_png(&sample(), &TileOptions::default(), &path).unwrap();
        assert!(path.exists());
    }
}
