pub mod canvas;
pub mod cell_sampler;
pub mod char_mapper;
pub mod color_enhance;
pub mod config;
pub mod crop;
pub mod error_codes;
pub mod glyph_atlas;
pub mod glyph_provider;
pub mod glyph_renderer;
pub mod grid_plan;
pub mod numeric;
pub mod pipeline;
pub mod sidecar;
