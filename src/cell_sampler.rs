use image::RgbImage;
use serde::Serialize;

use crate::grid_plan::{CellRect, GridSpec};
use crate::numeric::clamp_to_byte;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellSample {
    pub avg_color: [u8; 3],
    pub avg_luminance: f64,
}

/// Average colour and luminance of one cell.
///
/// The two averages use different divisors:
/// - `avg_color` divides each channel sum by the nominal cell area
///   (`cell_width * cell_height`), so clipped edge cells come out darker;
/// - `avg_luminance` is the plain mean over every channel of every pixel that
///   actually lies inside `rect`.
pub fn sample_cell(image: &RgbImage, rect: CellRect, spec: &GridSpec) -> CellSample {
    let mut sums = [0_u64; 3];
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let pixel = image.get_pixel(x, y).0;
            for (sum, value) in sums.iter_mut().zip(pixel) {
                *sum += u64::from(value);
            }
        }
    }

    let nominal_area = spec.nominal_cell_area();
    let avg_color = sums.map(|sum| {
        if nominal_area > 0.0 {
            clamp_to_byte(sum as f64 / nominal_area)
        } else {
            0
        }
    });

    let samples = rect.pixel_count() * 3;
    let avg_luminance = if samples == 0 {
        0.0
    } else {
        (sums.iter().sum::<u64>() as f64 / samples as f64).clamp(0.0, 255.0)
    };

    CellSample {
        avg_color,
        avg_luminance,
    }
}
