use image::{imageops, RgbImage};
use serde::Serialize;

use crate::canvas::Background;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Smallest box holding every non-background pixel.
///
/// On a black background a pixel counts when any channel is non-zero. On a
/// white background the canvas is viewed inverted (`255 - c`) and the same
/// rule applies. Returns `None` when nothing but background was drawn.
pub fn content_bounding_box(canvas: &RgbImage, background: Background) -> Option<CropBox> {
    let invert = background == Background::White;
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in canvas.enumerate_pixels() {
        let lit = pixel.0.iter().any(|&channel| {
            let value = if invert { 255 - channel } else { channel };
            value != 0
        });
        if !lit {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    bounds.map(|(x0, y0, x1, y1)| CropBox {
        x: x0,
        y: y0,
        width: x1 - x0 + 1,
        height: y1 - y0 + 1,
    })
}

/// Crop to the content box. A canvas holding only background comes back
/// unchanged with `None`.
pub fn crop_to_content(canvas: RgbImage, background: Background) -> (RgbImage, Option<CropBox>) {
    match content_bounding_box(&canvas, background) {
        Some(bounds) => {
            let cropped =
                imageops::crop_imm(&canvas, bounds.x, bounds.y, bounds.width, bounds.height)
                    .to_image();
            (cropped, Some(bounds))
        }
        None => (canvas, None),
    }
}
