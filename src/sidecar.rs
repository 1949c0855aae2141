use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::RenderConfig;
use crate::pipeline::ConversionReport;

pub const SIDECAR_VERSION: u32 = 1;

/// JSON written next to an artifact so a render can be pinned and compared.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSidecar<'a> {
    pub version: u32,
    pub input: String,
    pub output: String,
    pub config: &'a RenderConfig,
    pub report: &'a ConversionReport,
    pub sha256: String,
}

/// `render.png` -> `render.png.json`.
pub fn sidecar_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

pub fn write_sidecar(
    input: &Path,
    output: &Path,
    config: &RenderConfig,
    report: &ConversionReport,
) -> Result<PathBuf> {
    let bytes = fs::read(output)
        .with_context(|| format!("failed to read artifact {}", output.display()))?;
    let sidecar = ConversionSidecar {
        version: SIDECAR_VERSION,
        input: input.display().to_string(),
        output: output.display().to_string(),
        config,
        report,
        sha256: sha256_hex(&bytes),
    };

    let path = sidecar_path(output);
    let mut json = serde_json::to_string_pretty(&sidecar)?;
    json.push('\n');
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_path_appends_json_suffix() {
        assert_eq!(
            sidecar_path(Path::new("out/render.png")),
            PathBuf::from("out/render.png.json")
        );
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
