use anyhow::Result;
use image::RgbImage;

use crate::glyph_renderer::{unsupported_glyph, GlyphBox, GlyphRenderer};

pub const GLYPH_SIZE: u32 = 8;

/// Characters with built-in bitmaps, sparse to dense by lit pixel count.
pub const BUILTIN_RAMP: &str = " .:-=+*#%@";

type GlyphRows = [u8; GLYPH_SIZE as usize];

// One byte per row, most significant bit is the leftmost pixel.
const GLYPHS: [(char, GlyphRows); 10] = [
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x00]),
    (':', [0x00, 0x00, 0x18, 0x00, 0x00, 0x18, 0x00, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00]),
    ('=', [0x00, 0x00, 0x7E, 0x00, 0x7E, 0x00, 0x00, 0x00]),
    ('+', [0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00]),
    ('*', [0x00, 0x54, 0x38, 0xFE, 0x38, 0x54, 0x00, 0x00]),
    ('#', [0x24, 0x24, 0x7E, 0x24, 0x7E, 0x24, 0x24, 0x00]),
    ('%', [0xE2, 0xA6, 0xEC, 0x18, 0x37, 0x65, 0x47, 0x00]),
    ('@', [0x3C, 0x66, 0xDB, 0xD7, 0xDF, 0xC0, 0x7E, 0x00]),
];

/// Monospace 8x8 bitmap glyphs, optionally upscaled by an integer factor.
/// The measured box of a character is its full cell.
#[derive(Debug, Clone)]
pub struct PixelAtlas {
    pixel_scale: u32,
}

impl PixelAtlas {
    pub fn new(pixel_scale: u32) -> Self {
        Self {
            pixel_scale: pixel_scale.max(1),
        }
    }

    pub fn cell_size(&self) -> u32 {
        GLYPH_SIZE * self.pixel_scale
    }

    fn rows(ch: char) -> Option<&'static GlyphRows> {
        GLYPHS
            .iter()
            .find(|(glyph, _)| *glyph == ch)
            .map(|(_, rows)| rows)
    }
}

impl GlyphRenderer for PixelAtlas {
    fn name(&self) -> &str {
        "builtin-pixel-atlas"
    }

    fn supports(&self, ch: char) -> bool {
        Self::rows(ch).is_some()
    }

    fn measure(&mut self, text: &str) -> Result<GlyphBox> {
        let mut count = 0_i32;
        for ch in text.chars() {
            if !self.supports(ch) {
                return Err(unsupported_glyph(self.name(), ch));
            }
            count += 1;
        }
        if count == 0 {
            return Ok(GlyphBox::default());
        }
        let cell = self.cell_size() as i32;
        Ok(GlyphBox {
            left: 0,
            top: 0,
            right: cell * count,
            bottom: cell,
        })
    }

    fn draw(
        &mut self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        ch: char,
        color: [u8; 3],
    ) -> Result<()> {
        let Some(rows) = Self::rows(ch) else {
            return Err(unsupported_glyph(self.name(), ch));
        };
        let (canvas_width, canvas_height) = canvas.dimensions();
        let scale = self.pixel_scale as i32;

        for (gy, row) in rows.iter().enumerate() {
            for gx in 0..GLYPH_SIZE {
                if (row >> (GLYPH_SIZE - 1 - gx)) & 1 == 0 {
                    continue;
                }
                for dy in 0..scale {
                    let py = y + gy as i32 * scale + dy;
                    if py < 0 || py >= canvas_height as i32 {
                        continue;
                    }
                    for dx in 0..scale {
                        let px = x + gx as i32 * scale + dx;
                        if px < 0 || px >= canvas_width as i32 {
                            continue;
                        }
                        canvas.get_pixel_mut(px as u32, py as u32).0 = color;
                    }
                }
            }
        }
        Ok(())
    }
}
