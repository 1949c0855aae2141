use anyhow::{anyhow, Result};

use crate::error_codes::{CodedError, EMPTY_RAMP};
use crate::numeric::clamp_to_ramp_index;

/// Ordered character ramp. Index order is density order as supplied; the
/// mapper never reorders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRamp {
    chars: Vec<char>,
}

impl CharacterRamp {
    pub fn new(chars: Vec<char>) -> Result<Self> {
        if chars.is_empty() {
            return Err(anyhow!(CodedError::usage(
                EMPTY_RAMP,
                "character ramp must contain at least one character"
            )));
        }
        Ok(Self { chars })
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(text.chars().collect())
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn get(&self, index: usize) -> char {
        self.chars[index.min(self.chars.len() - 1)]
    }

    pub fn index_for(&self, avg_luminance: f64) -> usize {
        luminance_to_ramp_index(avg_luminance, self.chars.len())
    }
}

/// `floor(avg_luminance * num_chars / 255)`, clamped to `[0, num_chars - 1]`.
pub fn luminance_to_ramp_index(avg_luminance: f64, num_chars: usize) -> usize {
    if num_chars == 0 {
        return 0;
    }
    clamp_to_ramp_index(avg_luminance * num_chars as f64 / 255.0, num_chars)
}
