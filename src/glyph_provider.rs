//! Character ramps and glyph sources per language/mode selection.

use std::path::Path;

use anyhow::{anyhow, Result};
use image::RgbImage;
use serde::Serialize;
use serde_json::json;

use crate::char_mapper::CharacterRamp;
use crate::error_codes::{CodedError, FONT_REQUIRED, UNKNOWN_LANGUAGE, UNKNOWN_MODE};
use crate::glyph_atlas::{PixelAtlas, BUILTIN_RAMP, GLYPH_SIZE};
use crate::glyph_renderer::{unsupported_glyph, FontGlyphRenderer, GlyphRenderer};

const GENERAL_COMPLEX: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";
const LATIN: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const GERMAN: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyzÄÖÜäöüß";
const FRENCH: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyzÀÂÆÇÉÈÊËÎÏÔŒÙÛàâæçéèêëîïôœùûü";
const SPANISH: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyzÁÉÍÑÓÚÜáéíñóúü¿¡";
const RUSSIAN: &str =
    "АБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯабвгдеёжзийклмнопрстуфхцчшщъыьэюя";
const CHINESE: &str = "一二十丁人入八几了力乃三干于士土工才下寸大丈与万上小口山巾千川个久么义之尸弓己已子也女飞马王井开夫天无元专云扎艺木五支厅不太犬区历友尤匹车巨牙屯比互切瓦止少日中冈贝内水见午牛手毛气升长仁什片仆化仇币仍仅斤爪反介父从今凶分乏公仓月氏勿欠风丹匀乌凤勾文六方火为斗忆订计户认心尺引丑巴孔队办以允予劝双书幻制龘";
const JAPANESE: &str = "あいうえおかきくけこさしすせそたちつてとなにぬねのはひふへほまみむめもやゆよらりるれろわをんアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヲン";
const KOREAN: &str = "ㄱㄴㄷㄹㅁㅂㅅㅇㅈㅊㅋㅌㅍㅎ가나다라마바사아자차카타파하이기니디리미비시지치키티피히각난닫랄맘밥삿앙잦찿캌탙팦핳뷁";

/// Sample character used when the builtin atlas stands in for a font.
pub const ATLAS_SAMPLE_CHARACTER: &str = "@";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    General,
    English,
    German,
    French,
    Spanish,
    Russian,
    Chinese,
    Japanese,
    Korean,
}

const LANGUAGE_KEYWORDS: [&str; 9] = [
    "general", "english", "german", "french", "spanish", "russian", "chinese", "japanese",
    "korean",
];

impl Language {
    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "english" => Ok(Self::English),
            "german" => Ok(Self::German),
            "french" => Ok(Self::French),
            "spanish" => Ok(Self::Spanish),
            "russian" => Ok(Self::Russian),
            "chinese" => Ok(Self::Chinese),
            "japanese" => Ok(Self::Japanese),
            "korean" => Ok(Self::Korean),
            _ => Err(anyhow!(CodedError::usage(
                UNKNOWN_LANGUAGE,
                format!("unknown language '{value}'"),
            )
            .with_details(json!({
                "provided": value,
                "allowed": LANGUAGE_KEYWORDS,
            })))),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::English => "english",
            Self::German => "german",
            Self::French => "french",
            Self::Spanish => "spanish",
            Self::Russian => "russian",
            Self::Chinese => "chinese",
            Self::Japanese => "japanese",
            Self::Korean => "korean",
        }
    }

    pub fn sample_character(self) -> &'static str {
        match self {
            Self::Russian => "Ш",
            Self::Chinese => "制",
            Self::Japanese => "あ",
            Self::Korean => "이",
            _ => "A",
        }
    }

    pub fn default_font_size(self) -> f32 {
        if self.is_cjk() {
            10.0
        } else {
            20.0
        }
    }

    /// CJK glyphs are roughly square, so they need no vertical correction.
    pub fn default_scale(self) -> u32 {
        if self.is_cjk() {
            1
        } else {
            2
        }
    }

    fn is_cjk(self) -> bool {
        matches!(self, Self::Chinese | Self::Japanese | Self::Korean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RampMode {
    Standard,
    Complex,
}

impl RampMode {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Complex => "complex",
        }
    }
}

/// Ramp text for a language/mode pair, and whether it ships already ordered.
pub fn ramp_text(language: Language, mode: &str) -> Result<(RampMode, &'static str, bool)> {
    let normalized = mode.trim().to_ascii_lowercase();
    let entry = match (language, normalized.as_str()) {
        (Language::General, "standard") => Some((RampMode::Standard, BUILTIN_RAMP, true)),
        (Language::General, "complex") => Some((RampMode::Complex, GENERAL_COMPLEX, true)),
        (Language::English, "standard") => Some((RampMode::Standard, LATIN, false)),
        (Language::German, "standard") => Some((RampMode::Standard, GERMAN, false)),
        (Language::French, "standard") => Some((RampMode::Standard, FRENCH, false)),
        (Language::Spanish, "standard") => Some((RampMode::Standard, SPANISH, false)),
        (Language::Russian, "standard") => Some((RampMode::Standard, RUSSIAN, false)),
        (Language::Chinese, "standard") => Some((RampMode::Standard, CHINESE, false)),
        (Language::Japanese, "standard") => Some((RampMode::Standard, JAPANESE, false)),
        (Language::Korean, "standard") => Some((RampMode::Standard, KOREAN, false)),
        _ => None,
    };

    entry.ok_or_else(|| {
        let allowed: &[&str] = if language == Language::General {
            &["standard", "complex"]
        } else {
            &["standard"]
        };
        anyhow!(CodedError::usage(
            UNKNOWN_MODE,
            format!("unknown mode '{mode}' for language '{}'", language.keyword()),
        )
        .with_details(json!({
            "provided": mode,
            "language": language.keyword(),
            "allowed": allowed,
        })))
    })
}

#[derive(Debug, Clone)]
pub struct GlyphRequest<'a> {
    pub language: &'a str,
    pub mode: &'a str,
    pub font: Option<&'a Path>,
    pub font_size: Option<f32>,
    /// Order alphabet ramps by rendered coverage. Pre-ordered ramps are always
    /// kept verbatim.
    pub density_order: bool,
}

/// Everything the pipeline needs from the glyph side for one run.
pub struct GlyphSet {
    pub language: Language,
    pub mode: RampMode,
    pub ramp: CharacterRamp,
    pub renderer: Box<dyn GlyphRenderer>,
    pub sample_character: String,
    pub scale: u32,
}

impl std::fmt::Debug for GlyphSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphSet")
            .field("language", &self.language)
            .field("mode", &self.mode)
            .field("ramp_len", &self.ramp.len())
            .field("renderer", &self.renderer.name())
            .field("sample_character", &self.sample_character)
            .field("scale", &self.scale)
            .finish()
    }
}

impl GlyphSet {
    /// Build a set around any renderer. The ramp is used in the given order.
    pub fn custom(
        ramp: CharacterRamp,
        renderer: Box<dyn GlyphRenderer>,
        sample_character: &str,
        scale: u32,
    ) -> Result<Self> {
        let set = Self {
            language: Language::General,
            mode: RampMode::Standard,
            ramp,
            renderer,
            sample_character: sample_character.to_owned(),
            scale,
        };
        set.ensure_renderable()?;
        Ok(set)
    }

    /// The builtin bitmap glyphs with the general standard ramp.
    pub fn builtin(scale: u32) -> Result<Self> {
        Self::custom(
            CharacterRamp::from_text(BUILTIN_RAMP)?,
            Box::new(PixelAtlas::new(1)),
            ATLAS_SAMPLE_CHARACTER,
            scale,
        )
    }

    fn ensure_renderable(&self) -> Result<()> {
        let missing = self
            .ramp
            .chars()
            .iter()
            .copied()
            .chain(self.sample_character.chars())
            .find(|ch| !self.renderer.supports(*ch));
        match missing {
            Some(ch) => Err(unsupported_glyph(self.renderer.name(), ch)),
            None => Ok(()),
        }
    }
}

pub fn load_glyph_set(request: &GlyphRequest<'_>) -> Result<GlyphSet> {
    let language = Language::from_keyword(request.language)?;
    let (mode, text, preordered) = ramp_text(language, request.mode)?;
    let font_size = request
        .font_size
        .unwrap_or_else(|| language.default_font_size());

    let (mut renderer, sample_character): (Box<dyn GlyphRenderer>, &str) = match request.font {
        Some(path) => (
            Box::new(FontGlyphRenderer::from_path(path, font_size)?) as Box<dyn GlyphRenderer>,
            language.sample_character(),
        ),
        None if language == Language::General && mode == RampMode::Standard => {
            let pixel_scale = match request.font_size {
                Some(size) => (size / GLYPH_SIZE as f32).round().max(1.0) as u32,
                None => 1,
            };
            (
                Box::new(PixelAtlas::new(pixel_scale)) as Box<dyn GlyphRenderer>,
                ATLAS_SAMPLE_CHARACTER,
            )
        }
        None => {
            return Err(anyhow!(CodedError::usage(
                FONT_REQUIRED,
                format!(
                    "language '{}' mode '{}' needs a font file (--font)",
                    language.keyword(),
                    mode.keyword()
                ),
            )
            .with_details(json!({
                "language": language.keyword(),
                "mode": mode.keyword(),
                "builtin": "general/standard",
            }))));
        }
    };

    let chars = text.chars().collect::<Vec<_>>();
    let chars = if preordered || !request.density_order {
        chars
    } else {
        for ch in &chars {
            if !renderer.supports(*ch) {
                return Err(unsupported_glyph(renderer.name(), *ch));
            }
        }
        order_by_coverage(renderer.as_mut(), &chars)?
    };

    let set = GlyphSet {
        language,
        mode,
        ramp: CharacterRamp::new(chars)?,
        renderer,
        sample_character: sample_character.to_owned(),
        scale: language.default_scale(),
    };
    set.ensure_renderable()?;

    tracing::debug!(
        language = language.keyword(),
        mode = mode.keyword(),
        renderer = set.renderer.name(),
        ramp_len = set.ramp.len(),
        "loaded glyph set"
    );
    Ok(set)
}

/// Sort characters by rendered ink, sparse first; ties keep codepoint order.
pub fn order_by_coverage(renderer: &mut dyn GlyphRenderer, chars: &[char]) -> Result<Vec<char>> {
    let mut scored = Vec::with_capacity(chars.len());
    for &ch in chars {
        let mut buffer = [0_u8; 4];
        let bounds = renderer.measure(ch.encode_utf8(&mut buffer))?;
        let coverage = if bounds.is_empty() {
            0
        } else {
            let mut scratch = RgbImage::new(bounds.width(), bounds.height());
            renderer.draw(&mut scratch, -bounds.left, -bounds.top, ch, [255, 255, 255])?;
            scratch.pixels().map(|pixel| u64::from(pixel.0[0])).sum()
        };
        scored.push((coverage, ch));
    }

    scored.sort_by_key(|&(coverage, ch)| (coverage, ch));
    Ok(scored.into_iter().map(|(_, ch)| ch).collect())
}
