use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::{CodedError, DEGENERATE_GRID, INVALID_GLYPH_METRICS};
use crate::glyph_renderer::GlyphRenderer;
use crate::grid_plan::GridSpec;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Black,
    White,
}

impl Background {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Black => [0, 0, 0],
            Self::White => [255, 255, 255],
        }
    }
}

/// Cell size on the output canvas, taken from one sample character and
/// assumed for every character in the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphMetrics {
    pub char_width: u32,
    pub char_height: u32,
}

impl GlyphMetrics {
    pub fn from_sample(renderer: &mut dyn GlyphRenderer, sample: &str) -> Result<Self> {
        let bounds = renderer.measure(sample)?;
        if bounds.is_empty() {
            return Err(anyhow!(CodedError::usage(
                INVALID_GLYPH_METRICS,
                format!(
                    "sample character '{}' has an empty bounding box in {}",
                    sample.escape_default(),
                    renderer.name()
                ),
            )
            .with_details(json!({ "sample": sample, "renderer": renderer.name() }))));
        }
        Ok(Self {
            char_width: bounds.width(),
            char_height: bounds.height(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGlyph {
    pub ch: char,
    pub color: [u8; 3],
}

/// Output canvas of `(char_width * num_cols) x (scale * char_height * num_rows)`
/// filled with the background colour. Cell `(row, col)` is drawn with its
/// origin at `(col * char_width, row * char_height)`.
#[derive(Debug, Clone)]
pub struct CanvasRenderer {
    canvas: RgbImage,
    metrics: GlyphMetrics,
    spec: GridSpec,
}

impl CanvasRenderer {
    pub fn new(
        spec: &GridSpec,
        metrics: GlyphMetrics,
        scale: u32,
        background: Background,
    ) -> Result<Self> {
        let width = metrics.char_width.checked_mul(spec.num_cols);
        let height = scale
            .checked_mul(metrics.char_height)
            .and_then(|value| value.checked_mul(spec.num_rows));
        let (Some(width), Some(height)) = (width, height) else {
            return Err(anyhow!(CodedError::usage(
                DEGENERATE_GRID,
                "output canvas dimensions overflow"
            )
            .with_details(json!({
                "num_cols": spec.num_cols,
                "num_rows": spec.num_rows,
                "char_width": metrics.char_width,
                "char_height": metrics.char_height,
                "scale": scale,
            }))));
        };
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(anyhow!(CodedError::usage(
                DEGENERATE_GRID,
                format!("output canvas would be {width}x{height}")
            )));
        }

        Ok(Self {
            canvas: RgbImage::from_pixel(width, height, Rgb(background.rgb())),
            metrics,
            spec: *spec,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Top-left of cell `(row, col)`. Cells outside the canvas are rejected.
    pub fn cell_origin(&self, row: u32, col: u32) -> Result<(i32, i32)> {
        let origin = |index: u32, size: u32| {
            index
                .checked_mul(size)
                .and_then(|offset| i32::try_from(offset).ok())
        };
        let (width, height) = self.canvas.dimensions();
        match (
            origin(col, self.metrics.char_width),
            origin(row, self.metrics.char_height),
        ) {
            (Some(x), Some(y)) if (x as u32) < width && (y as u32) < height => Ok((x, y)),
            _ => Err(anyhow!(CodedError::usage(
                DEGENERATE_GRID,
                format!("cell ({row}, {col}) lies outside the {width}x{height} canvas")
            ))),
        }
    }

    /// Rasterizer failures are returned unchanged.
    pub fn draw_cell(
        &mut self,
        renderer: &mut dyn GlyphRenderer,
        row: u32,
        col: u32,
        glyph: CellGlyph,
    ) -> Result<()> {
        debug_assert!(row < self.spec.num_rows && col < self.spec.num_cols);
        let (x, y) = self.cell_origin(row, col)?;
        renderer.draw(&mut self.canvas, x, y, glyph.ch, glyph.color)
    }

    pub fn into_image(self) -> RgbImage {
        self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes::find_coded_error;
    use crate::glyph_atlas::PixelAtlas;

    fn spec(num_rows: u32, num_cols: u32) -> GridSpec {
        GridSpec {
            cell_width: 4.0,
            cell_height: 8.0,
            num_rows,
            num_cols,
        }
    }

    #[test]
    fn canvas_size_includes_scale_on_height_only() {
        let metrics = GlyphMetrics {
            char_width: 8,
            char_height: 8,
        };
        let renderer = CanvasRenderer::new(&spec(3, 5), metrics, 2, Background::White).unwrap();
        assert_eq!(renderer.dimensions(), (40, 48));
        assert!(renderer
            .into_image()
            .pixels()
            .all(|pixel| pixel.0 == [255, 255, 255]));
    }

    #[test]
    fn cells_are_drawn_at_row_and_column_origin() {
        let mut atlas = PixelAtlas::new(1);
        let metrics = GlyphMetrics::from_sample(&mut atlas, "@").unwrap();
        assert_eq!(metrics, GlyphMetrics { char_width: 8, char_height: 8 });

        let mut renderer = CanvasRenderer::new(&spec(2, 2), metrics, 1, Background::Black).unwrap();
        renderer
            .draw_cell(&mut atlas, 1, 1, CellGlyph { ch: '-', color: [9, 8, 7] })
            .unwrap();
        let image = renderer.into_image();
        // '-' lights row 3, columns 1..=6 of its cell.
        assert_eq!(image.get_pixel(9, 11).0, [9, 8, 7]);
        assert_eq!(image.get_pixel(1, 3).0, [0, 0, 0]);
    }

    #[test]
    fn empty_sample_glyph_is_rejected() {
        let mut atlas = PixelAtlas::new(1);
        let error = GlyphMetrics::from_sample(&mut atlas, "").unwrap_err();
        assert_eq!(find_coded_error(&error).unwrap().code, INVALID_GLYPH_METRICS);
    }

    #[test]
    fn canvas_wider_than_signed_pixel_range_is_rejected() {
        let metrics = GlyphMetrics {
            char_width: 1 << 30,
            char_height: 1,
        };
        let error = CanvasRenderer::new(&spec(1, 2), metrics, 1, Background::Black).unwrap_err();
        assert_eq!(find_coded_error(&error).unwrap().code, DEGENERATE_GRID);
    }

    #[test]
    fn cell_origin_is_checked_against_the_canvas() {
        let metrics = GlyphMetrics {
            char_width: 8,
            char_height: 8,
        };
        let renderer = CanvasRenderer::new(&spec(2, 3), metrics, 2, Background::Black).unwrap();
        assert_eq!(renderer.cell_origin(1, 2).unwrap(), (16, 8));
        let error = renderer.cell_origin(0, 3).unwrap_err();
        assert_eq!(find_coded_error(&error).unwrap().code, DEGENERATE_GRID);
        assert!(renderer.cell_origin(u32::MAX, 0).is_err());
    }

    #[test]
    fn overflowing_canvas_is_rejected() {
        let metrics = GlyphMetrics {
            char_width: u32::MAX,
            char_height: 8,
        };
        let error = CanvasRenderer::new(&spec(1, 2), metrics, 1, Background::Black).unwrap_err();
        assert_eq!(find_coded_error(&error).unwrap().code, DEGENERATE_GRID);
    }
}
