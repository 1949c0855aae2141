use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fontdue::layout::{
    CoordinateSystem, GlyphPosition, GlyphRasterConfig, Layout, LayoutSettings, TextStyle,
};
use fontdue::Font;
use image::RgbImage;
use serde::Serialize;
use serde_json::json;

use crate::error_codes::{CodedError, UNSUPPORTED_GLYPH};

/// Ink bounding box in layout coordinates (y grows downward, origin at the
/// draw position). `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlyphBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl GlyphBox {
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    fn union(self, other: GlyphBox) -> GlyphBox {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        GlyphBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Measures and draws single characters onto an RGB canvas.
pub trait GlyphRenderer {
    fn name(&self) -> &str;

    fn supports(&self, ch: char) -> bool;

    /// Ink box of `text` laid out from the origin.
    fn measure(&mut self, text: &str) -> Result<GlyphBox>;

    /// Draw `ch` with its layout origin at `(x, y)`. Pixels outside the canvas
    /// are dropped.
    fn draw(
        &mut self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        ch: char,
        color: [u8; 3],
    ) -> Result<()>;
}

pub(crate) fn unsupported_glyph(renderer: &str, ch: char) -> anyhow::Error {
    anyhow!(CodedError::glyph(
        UNSUPPORTED_GLYPH,
        format!(
            "unsupported codepoint U+{:04X} ({}) in {}",
            ch as u32,
            ch.escape_default(),
            renderer
        ),
    )
    .with_details(json!({ "codepoint": ch as u32, "renderer": renderer })))
}

#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub bitmap: Vec<u8>,
}

/// TrueType/OpenType glyphs rasterized with fontdue.
pub struct FontGlyphRenderer {
    font: Font,
    font_size: f32,
    label: String,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl FontGlyphRenderer {
    pub fn from_path(font_path: &Path, font_size: f32) -> Result<Self> {
        let font_bytes = std::fs::read(font_path)
            .with_context(|| format!("failed to read font file {}", font_path.display()))?;
        Self::from_bytes(font_bytes, font_size, &font_path.display().to_string())
    }

    pub fn from_bytes(font_bytes: Vec<u8>, font_size: f32, label: &str) -> Result<Self> {
        let font = Font::from_bytes(font_bytes, fontdue::FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font {label}: {error}"))?;
        Ok(Self {
            font,
            font_size,
            label: label.to_owned(),
            glyph_cache: HashMap::new(),
        })
    }

    fn layout(&self, text: &str, x: f32, y: f32) -> Vec<GlyphPosition> {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y,
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(text, self.font_size, 0));
        layout.glyphs().clone()
    }

    fn ensure_supported(&self, text: &str) -> Result<()> {
        for ch in text.chars() {
            if !self.supports(ch) {
                return Err(unsupported_glyph(&self.label, ch));
            }
        }
        Ok(())
    }
}

impl GlyphRenderer for FontGlyphRenderer {
    fn name(&self) -> &str {
        &self.label
    }

    fn supports(&self, ch: char) -> bool {
        ch.is_whitespace() || self.font.lookup_glyph_index(ch) != 0
    }

    fn measure(&mut self, text: &str) -> Result<GlyphBox> {
        self.ensure_supported(text)?;
        let bounds = self
            .layout(text, 0.0, 0.0)
            .iter()
            .filter(|glyph| glyph.width > 0 && glyph.height > 0)
            .map(|glyph| {
                let left = glyph.x.round() as i32;
                let top = glyph.y.round() as i32;
                GlyphBox {
                    left,
                    top,
                    right: left + glyph.width as i32,
                    bottom: top + glyph.height as i32,
                }
            })
            .fold(GlyphBox::default(), GlyphBox::union);
        Ok(bounds)
    }

    fn draw(
        &mut self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        ch: char,
        color: [u8; 3],
    ) -> Result<()> {
        if !self.supports(ch) {
            return Err(unsupported_glyph(&self.label, ch));
        }
        let mut text = [0_u8; 4];
        let glyphs = self.layout(ch.encode_utf8(&mut text), x as f32, y as f32);

        for glyph in glyphs {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let glyph_bitmap = self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                let (_, bitmap) = self.font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    bitmap,
                }
            });

            blend_glyph(
                canvas,
                glyph.x.round() as i32,
                glyph.y.round() as i32,
                glyph_bitmap,
                color,
            );
        }
        Ok(())
    }
}

/// Composite an 8-bit coverage mask in `color` over the canvas.
pub fn blend_glyph(canvas: &mut RgbImage, x: i32, y: i32, glyph: &GlyphBitmap, color: [u8; 3]) {
    let (canvas_width, canvas_height) = canvas.dimensions();
    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= canvas_height as i32 {
            continue;
        }

        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= canvas_width as i32 {
                continue;
            }

            let mask = glyph.bitmap[row * glyph.width + col];
            if mask == 0 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            pixel.0 = blend_pixel(pixel.0, color, mask);
        }
    }
}

pub fn blend_pixel(dst: [u8; 3], src: [u8; 3], alpha: u8) -> [u8; 3] {
    let alpha = u16::from(alpha);
    let inv_alpha = 255_u16 - alpha;
    let mut out = dst;
    for channel in 0..3 {
        let d = u16::from(dst[channel]);
        let s = u16::from(src[channel]);
        out[channel] = ((s * alpha + d * inv_alpha + 127) / 255) as u8;
    }
    out
}
