use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

pub const INVALID_NUM_COLS: &str = "INVALID_NUM_COLS";
pub const INVALID_SCALE: &str = "INVALID_SCALE";
pub const INVALID_ENHANCE_FACTOR: &str = "INVALID_ENHANCE_FACTOR";
pub const INVALID_FONT_SIZE: &str = "INVALID_FONT_SIZE";
pub const UNKNOWN_LANGUAGE: &str = "UNKNOWN_LANGUAGE";
pub const UNKNOWN_MODE: &str = "UNKNOWN_MODE";
pub const FONT_REQUIRED: &str = "FONT_REQUIRED";
pub const UNSUPPORTED_GLYPH: &str = "UNSUPPORTED_GLYPH";
pub const EMPTY_RAMP: &str = "EMPTY_RAMP";
pub const DEGENERATE_GRID: &str = "DEGENERATE_GRID";
pub const INVALID_PROFILE: &str = "INVALID_PROFILE";
pub const INVALID_GLYPH_METRICS: &str = "INVALID_GLYPH_METRICS";
pub const CONVERSION_FAILED: &str = "CONVERSION_FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodedErrorKind {
    /// Rejected configuration; nothing was rendered.
    Usage,
    /// The glyph rasterizer could not produce a character.
    Glyph,
}

#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Usage,
        }
    }

    pub fn glyph(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Glyph,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: self.code.to_owned(),
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

/// Envelope for any pipeline failure. Uncoded errors (I/O, decode) report
/// `CONVERSION_FAILED` with the full context chain as the message.
pub fn envelope_for(error: &Error) -> ErrorEnvelope {
    match find_coded_error(error) {
        Some(coded) => coded.envelope(),
        None => ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: CONVERSION_FAILED.to_owned(),
                message: format!("{error:#}"),
                details: None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};
    use serde_json::json;

    use super::*;

    #[test]
    fn coded_error_survives_context_wrapping() {
        let error = Err::<(), _>(anyhow!(CodedError::usage(
            INVALID_NUM_COLS,
            "num_cols must be >= 1"
        )))
        .context("validating render config")
        .unwrap_err();

        let coded = find_coded_error(&error).expect("coded error should be in chain");
        assert_eq!(coded.code, INVALID_NUM_COLS);
        assert_eq!(coded.kind, CodedErrorKind::Usage);
    }

    #[test]
    fn envelope_serializes_details_only_when_present() {
        let bare = CodedError::usage(EMPTY_RAMP, "ramp is empty").envelope();
        let value = serde_json::to_value(&bare).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert!(value["error"].get("details").is_none());

        let detailed = CodedError::usage(UNKNOWN_MODE, "bad mode")
            .with_details(json!({ "provided": "x" }))
            .envelope();
        let value = serde_json::to_value(&detailed).unwrap();
        assert_eq!(value["error"]["details"]["provided"], json!("x"));
    }

    #[test]
    fn uncoded_errors_fall_back_to_conversion_failed() {
        let error = anyhow!("disk on fire").context("failed to save artifact");
        let envelope = envelope_for(&error);
        assert_eq!(envelope.error.code, CONVERSION_FAILED);
        assert!(envelope.error.message.contains("disk on fire"));
    }
}
