use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::canvas::Background;
use crate::error_codes::{
    CodedError, INVALID_ENHANCE_FACTOR, INVALID_FONT_SIZE, INVALID_NUM_COLS, INVALID_PROFILE,
    INVALID_SCALE,
};
use crate::glyph_provider::GlyphRequest;

pub const DEFAULT_LANGUAGE: &str = "chinese";
pub const DEFAULT_MODE: &str = "standard";
pub const DEFAULT_NUM_COLS: u32 = 300;
pub const DEFAULT_SATURATION: f64 = 1.5;
pub const DEFAULT_BRIGHTNESS: f64 = 1.5;

/// Immutable settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderConfig {
    pub language: String,
    pub mode: String,
    pub background: Background,
    pub num_cols: u32,
    /// Overrides the glyph set's aspect correction when set.
    pub scale: Option<u32>,
    pub saturation: f64,
    pub brightness: f64,
    pub font: Option<PathBuf>,
    pub font_size: Option<f32>,
    pub density_order: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            mode: DEFAULT_MODE.to_owned(),
            background: Background::Black,
            num_cols: DEFAULT_NUM_COLS,
            scale: None,
            saturation: DEFAULT_SATURATION,
            brightness: DEFAULT_BRIGHTNESS,
            font: None,
            font_size: None,
            density_order: true,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_cols == 0 {
            return Err(anyhow!(CodedError::usage(
                INVALID_NUM_COLS,
                "num_cols must be >= 1"
            )
            .with_details(json!({ "provided": self.num_cols }))));
        }
        if self.scale == Some(0) {
            return Err(anyhow!(CodedError::usage(INVALID_SCALE, "scale must be >= 1")
                .with_details(json!({ "provided": 0 }))));
        }
        for (name, value) in [
            ("saturation", self.saturation),
            ("brightness", self.brightness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!(CodedError::usage(
                    INVALID_ENHANCE_FACTOR,
                    format!("{name} must be a finite number >= 0, got {value}")
                )
                .with_details(json!({ "field": name, "provided": value.to_string() }))));
            }
        }
        if let Some(size) = self.font_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(anyhow!(CodedError::usage(
                    INVALID_FONT_SIZE,
                    format!("font size must be a finite number > 0, got {size}")
                )));
            }
        }
        Ok(())
    }

    pub fn resolved_scale(&self, glyph_scale: u32) -> u32 {
        self.scale.unwrap_or(glyph_scale)
    }

    pub fn glyph_request(&self) -> GlyphRequest<'_> {
        GlyphRequest {
            language: &self.language,
            mode: &self.mode,
            font: self.font.as_deref(),
            font_size: self.font_size,
            density_order: self.density_order,
        }
    }

    /// Fields set in `profile` replace the current values.
    pub fn with_profile(mut self, profile: &RenderProfile) -> Self {
        if let Some(language) = &profile.language {
            self.language = language.clone();
        }
        if let Some(mode) = &profile.mode {
            self.mode = mode.clone();
        }
        if let Some(background) = profile.background {
            self.background = background;
        }
        if let Some(num_cols) = profile.num_cols {
            self.num_cols = num_cols;
        }
        if profile.scale.is_some() {
            self.scale = profile.scale;
        }
        if let Some(saturation) = profile.saturation {
            self.saturation = saturation;
        }
        if let Some(brightness) = profile.brightness {
            self.brightness = brightness;
        }
        if let Some(font) = &profile.font {
            self.font = Some(font.clone());
        }
        if profile.font_size.is_some() {
            self.font_size = profile.font_size;
        }
        if let Some(density_order) = profile.density_order {
            self.density_order = density_order;
        }
        self
    }
}

/// Partial config read from a YAML profile. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderProfile {
    pub language: Option<String>,
    pub mode: Option<String>,
    pub background: Option<Background>,
    pub num_cols: Option<u32>,
    pub scale: Option<u32>,
    pub saturation: Option<f64>,
    pub brightness: Option<f64>,
    pub font: Option<PathBuf>,
    pub font_size: Option<f32>,
    pub density_order: Option<bool>,
}

impl RenderProfile {
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|error| {
            anyhow!(CodedError::usage(
                INVALID_PROFILE,
                format!("invalid render profile: {error}")
            ))
        })
    }
}

/// Load a profile; a relative `font` path resolves against the profile's
/// directory.
pub fn load_profile(path: &Path) -> Result<RenderProfile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read render profile {}", path.display()))?;
    let mut profile = RenderProfile::parse(&raw)
        .with_context(|| format!("failed to parse render profile {}", path.display()))?;

    if let (Some(font), Some(parent)) = (&profile.font, path.parent()) {
        if font.is_relative() {
            profile.font = Some(parent.join(font));
        }
    }
    Ok(profile)
}
