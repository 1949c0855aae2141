use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::json;

use crate::error_codes::{CodedError, DEGENERATE_GRID, INVALID_NUM_COLS, INVALID_SCALE};

pub const FALLBACK_CELL_WIDTH: f64 = 6.0;
pub const FALLBACK_CELL_HEIGHT: f64 = 12.0;

/// Cell geometry for one conversion. Cell sizes are fractional source pixels;
/// pixel rectangles are derived by flooring the cell edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSpec {
    pub cell_width: f64,
    pub cell_height: f64,
    pub num_rows: u32,
    pub num_cols: u32,
}

/// Set when the requested column count would make cells smaller than a pixel
/// and the fixed 6x12 cell was used instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridFallback {
    pub requested_cols: u32,
    pub requested_rows: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPlan {
    pub spec: GridSpec,
    pub fallback: Option<GridFallback>,
}

/// Half-open source pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl CellRect {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }
}

impl GridSpec {
    pub fn cell_count(&self) -> usize {
        self.num_rows as usize * self.num_cols as usize
    }

    pub fn nominal_cell_area(&self) -> f64 {
        self.cell_width * self.cell_height
    }

    /// Source rectangle of cell `(row, col)`, clipped to the image edge.
    pub fn cell_rect(&self, row: u32, col: u32, image_width: u32, image_height: u32) -> CellRect {
        let edge = |index: u32, size: f64, limit: u32| -> u32 {
            let raw = (f64::from(index) * size).floor();
            if raw >= f64::from(limit) {
                limit
            } else {
                raw as u32
            }
        };

        CellRect {
            x0: edge(col, self.cell_width, image_width),
            x1: edge(col + 1, self.cell_width, image_width),
            y0: edge(row, self.cell_height, image_height),
            y1: edge(row + 1, self.cell_height, image_height),
        }
    }
}

/// Derive the grid for a `width x height` image.
///
/// `cell_width = width / num_cols`, `cell_height = scale * cell_width`,
/// `num_rows = floor(height / cell_height)`. Sub-pixel requests fall back to a
/// fixed 6x12 cell; the substitution is logged and reported in
/// [`GridPlan::fallback`].
pub fn plan_grid(width: u32, height: u32, num_cols: u32, scale: u32) -> Result<GridPlan> {
    if num_cols == 0 {
        return Err(anyhow!(CodedError::usage(
            INVALID_NUM_COLS,
            "num_cols must be >= 1"
        )
        .with_details(json!({ "provided": num_cols }))));
    }
    if scale == 0 {
        return Err(anyhow!(CodedError::usage(INVALID_SCALE, "scale must be >= 1")
            .with_details(json!({ "provided": scale }))));
    }
    if width == 0 || height == 0 {
        return Err(anyhow!(CodedError::usage(
            DEGENERATE_GRID,
            format!("source image {width}x{height} has no pixels")
        )));
    }

    let cell_width = f64::from(width) / f64::from(num_cols);
    let cell_height = f64::from(scale) * cell_width;
    let num_rows = (f64::from(height) / cell_height).floor() as u32;

    let plan = if num_cols > width || num_rows > height {
        tracing::warn!(
            requested_cols = num_cols,
            requested_rows = num_rows,
            width,
            height,
            "too many columns or rows for the source resolution; using 6x12 cells"
        );
        GridPlan {
            spec: GridSpec {
                cell_width: FALLBACK_CELL_WIDTH,
                cell_height: FALLBACK_CELL_HEIGHT,
                num_rows: (f64::from(height) / FALLBACK_CELL_HEIGHT).floor() as u32,
                num_cols: (f64::from(width) / FALLBACK_CELL_WIDTH).floor() as u32,
            },
            fallback: Some(GridFallback {
                requested_cols: num_cols,
                requested_rows: num_rows,
            }),
        }
    } else {
        GridPlan {
            spec: GridSpec {
                cell_width,
                cell_height,
                num_rows,
                num_cols,
            },
            fallback: None,
        }
    };

    if plan.spec.num_rows == 0 || plan.spec.num_cols == 0 {
        return Err(anyhow!(CodedError::usage(
            DEGENERATE_GRID,
            format!(
                "grid for {width}x{height} image has {} columns and {} rows",
                plan.spec.num_cols, plan.spec.num_rows
            )
        )
        .with_details(json!({
            "width": width,
            "height": height,
            "num_cols": num_cols,
            "scale": scale,
        }))));
    }

    tracing::debug!(
        cell_width = plan.spec.cell_width,
        cell_height = plan.spec.cell_height,
        num_cols = plan.spec.num_cols,
        num_rows = plan.spec.num_rows,
        "planned character grid"
    );
    Ok(plan)
}
