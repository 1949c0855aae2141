//! Image to tinted character art.
//!
//! Stages, all single threaded:
//!
//! 1. **Grid** - cell geometry from the source size and requested columns
//! 2. **Per cell, row-major** - sample colour and luminance, pick a ramp
//!    character, enhance the colour, draw the glyph onto the canvas
//! 3. **Crop** - trim the canvas to its non-background extent
//!
//! Output depends only on the source pixels, the glyph set and the config, so
//! identical inputs give byte-identical artifacts.

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageReader, RgbImage};
use serde::Serialize;

use crate::canvas::{CanvasRenderer, CellGlyph, GlyphMetrics};
use crate::cell_sampler::sample_cell;
use crate::color_enhance::ColorEnhancer;
use crate::config::RenderConfig;
use crate::crop::{crop_to_content, CropBox};
use crate::glyph_provider::{load_glyph_set, GlyphSet};
use crate::grid_plan::{plan_grid, GridFallback, GridSpec};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub source_width: u32,
    pub source_height: u32,
    pub grid: GridSpec,
    /// Present when the requested column count was replaced by 6x12 cells.
    pub grid_fallback: Option<GridFallback>,
    pub scale: u32,
    pub glyph: GlyphMetrics,
    pub renderer: String,
    pub ramp_len: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// `None` when the canvas held only background and was left uncropped.
    pub crop: Option<CropBox>,
    pub output_width: u32,
    pub output_height: u32,
    /// Selected ramp index per cell, row-major.
    #[serde(skip)]
    pub ramp_indices: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub image: RgbImage,
    pub report: ConversionReport,
}

pub fn convert(
    source: &RgbImage,
    glyphs: &mut GlyphSet,
    config: &RenderConfig,
) -> Result<Conversion> {
    config.validate()?;
    let scale = config.resolved_scale(glyphs.scale);
    let (width, height) = source.dimensions();

    let plan = plan_grid(width, height, config.num_cols, scale)?;
    let spec = plan.spec;
    let metrics = GlyphMetrics::from_sample(glyphs.renderer.as_mut(), &glyphs.sample_character)?;
    let mut canvas = CanvasRenderer::new(&spec, metrics, scale, config.background)?;
    let (canvas_width, canvas_height) = canvas.dimensions();
    let enhancer = ColorEnhancer::new(config.saturation, config.brightness);

    let mut ramp_indices = Vec::with_capacity(spec.cell_count());
    for row in 0..spec.num_rows {
        for col in 0..spec.num_cols {
            let sample = sample_cell(source, spec.cell_rect(row, col, width, height), &spec);
            let index = glyphs.ramp.index_for(sample.avg_luminance);
            let glyph = CellGlyph {
                ch: glyphs.ramp.get(index),
                color: enhancer.enhance(sample.avg_color),
            };
            canvas.draw_cell(glyphs.renderer.as_mut(), row, col, glyph)?;
            ramp_indices.push(index);
        }
    }

    let (image, crop) = crop_to_content(canvas.into_image(), config.background);
    if crop.is_none() {
        tracing::debug!("canvas holds only background; skipping crop");
    }
    let (output_width, output_height) = image.dimensions();

    Ok(Conversion {
        image,
        report: ConversionReport {
            source_width: width,
            source_height: height,
            grid: spec,
            grid_fallback: plan.fallback,
            scale,
            glyph: metrics,
            renderer: glyphs.renderer.name().to_owned(),
            ramp_len: glyphs.ramp.len(),
            canvas_width,
            canvas_height,
            crop,
            output_width,
            output_height,
            ramp_indices,
        },
    })
}

pub fn load_source_image(path: &Path) -> Result<RgbImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to probe image format {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode image {}", path.display()))?
        .to_rgb8();
    Ok(image)
}

/// Encode by file extension.
pub fn save_artifact(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Load, convert and save. Nothing is written unless every cell rendered.
pub fn run_file_conversion(
    input: &Path,
    output: &Path,
    config: &RenderConfig,
) -> Result<ConversionReport> {
    config.validate()?;
    let mut glyphs = load_glyph_set(&config.glyph_request())?;
    let source = load_source_image(input)?;
    let conversion = convert(&source, &mut glyphs, config)?;
    save_artifact(&conversion.image, output)?;

    tracing::info!(
        output = %output.display(),
        width = conversion.report.output_width,
        height = conversion.report.output_height,
        "wrote character render"
    );
    Ok(conversion.report)
}
