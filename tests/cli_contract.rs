use std::fs;
use std::path::Path;
use std::process::Command;

use image::{Rgb, RgbImage};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn write_source(path: &Path) {
    RgbImage::from_fn(64, 64, |x, y| {
        Rgb([(x * 4) as u8, (y * 4) as u8, 128])
    })
    .save(path)
    .expect("source image should write");
}

fn run_glyphtint(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_glyphtint"))
        .current_dir(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("glyphtint command should run")
}

fn error_code(output: &std::process::Output) -> String {
    let envelope: Value = serde_json::from_slice(&output.stdout).expect("envelope should parse");
    assert_eq!(envelope["ok"], Value::Bool(false));
    envelope["error"]["code"]
        .as_str()
        .expect("code should be a string")
        .to_owned()
}

#[test]
fn general_render_writes_artifact_and_sidecar() {
    let dir = tempdir().expect("tempdir should create");
    write_source(&dir.path().join("in.png"));

    let output = run_glyphtint(
        dir.path(),
        &[
            "--input",
            "in.png",
            "--output",
            "out.png",
            "--language",
            "general",
            "--num_cols",
            "10",
            "--sidecar",
        ],
    );
    assert!(
        output.status.success(),
        "render should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote out.png"), "{stdout}");

    let artifact = fs::read(dir.path().join("out.png")).expect("artifact should exist");
    let decoded = image::load_from_memory(&artifact).expect("artifact should decode");
    assert!(decoded.width() > 0 && decoded.height() > 0);

    let sidecar: Value = serde_json::from_slice(
        &fs::read(dir.path().join("out.png.json")).expect("sidecar should exist"),
    )
    .expect("sidecar should parse");
    let digest = Sha256::digest(&artifact)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    assert_eq!(sidecar["sha256"], Value::String(digest));
    assert_eq!(sidecar["version"], Value::from(1));
    assert_eq!(sidecar["config"]["language"], Value::from("general"));
    assert_eq!(sidecar["report"]["grid"]["num_cols"], Value::from(10));
    // 64 / 10 = 6.4 wide, 12.8 tall with the default scale of 2.
    assert_eq!(sidecar["report"]["grid"]["num_rows"], Value::from(5));
    assert_eq!(sidecar["report"]["scale"], Value::from(2));
}

#[test]
fn json_summary_is_stable_across_runs() {
    let dir = tempdir().expect("tempdir should create");
    write_source(&dir.path().join("in.png"));
    let args = [
        "--input",
        "in.png",
        "--output",
        "out.png",
        "--language",
        "general",
        "--num-cols",
        "16",
        "--background",
        "white",
        "--json",
    ];

    let first = run_glyphtint(dir.path(), &args);
    assert!(first.status.success(), "first run should succeed");
    let first_bytes = fs::read(dir.path().join("out.png")).expect("artifact should exist");

    let second = run_glyphtint(dir.path(), &args);
    assert!(second.status.success(), "second run should succeed");
    let second_bytes = fs::read(dir.path().join("out.png")).expect("artifact should exist");

    assert_eq!(first.stdout, second.stdout, "json output should be stable");
    assert_eq!(first_bytes, second_bytes, "artifact should be byte-identical");

    let parsed: Value = serde_json::from_slice(&first.stdout).expect("json should parse");
    assert_eq!(parsed["ok"], Value::Bool(true));
    assert_eq!(parsed["sidecar"], Value::Null);
    assert_eq!(parsed["report"]["grid"]["num_cols"], Value::from(16));
}

#[test]
fn default_language_without_font_reports_font_required() {
    let dir = tempdir().expect("tempdir should create");
    write_source(&dir.path().join("in.png"));

    let output = run_glyphtint(
        dir.path(),
        &["--input", "in.png", "--output", "out.png", "--json"],
    );
    assert!(!output.status.success());
    assert_eq!(error_code(&output), "FONT_REQUIRED");
    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn invalid_values_map_to_stable_codes() {
    let dir = tempdir().expect("tempdir should create");
    write_source(&dir.path().join("in.png"));
    let cases: [(&[&str], &str); 4] = [
        (&["--language", "general", "--num_cols", "0"], "INVALID_NUM_COLS"),
        (&["--language", "general", "--saturation", "-1"], "INVALID_ENHANCE_FACTOR"),
        (&["--language", "klingon"], "UNKNOWN_LANGUAGE"),
        (&["--language", "english", "--mode", "complex"], "UNKNOWN_MODE"),
    ];

    for (extra, code) in cases {
        let mut args = vec!["--input", "in.png", "--output", "out.png", "--json"];
        args.extend_from_slice(extra);
        let output = run_glyphtint(dir.path(), &args);
        assert!(!output.status.success(), "{extra:?} should fail");
        assert_eq!(error_code(&output), code, "{extra:?}");
    }
}

#[test]
fn uncoded_failures_use_conversion_failed_envelope() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_glyphtint(
        dir.path(),
        &[
            "--input",
            "missing.png",
            "--output",
            "out.png",
            "--language",
            "general",
            "--json",
        ],
    );
    assert!(!output.status.success());
    assert_eq!(error_code(&output), "CONVERSION_FAILED");
}

#[test]
fn plain_errors_go_to_stderr() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_glyphtint(
        dir.path(),
        &[
            "--input",
            "missing.png",
            "--output",
            "out.png",
            "--language",
            "general",
        ],
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open image"), "{stderr}");
}

#[test]
fn command_line_flags_override_profile_values() {
    let dir = tempdir().expect("tempdir should create");
    write_source(&dir.path().join("in.png"));
    fs::write(
        dir.path().join("profile.yaml"),
        "language: general\nnum_cols: 8\nscale: 1\n",
    )
    .expect("profile should write");

    let output = run_glyphtint(
        dir.path(),
        &[
            "--input",
            "in.png",
            "--output",
            "out.png",
            "--profile",
            "profile.yaml",
            "--num_cols",
            "4",
            "--json",
        ],
    );
    assert!(
        output.status.success(),
        "render should succeed: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("json should parse");
    assert_eq!(parsed["report"]["grid"]["num_cols"], Value::from(4));
    assert_eq!(parsed["report"]["scale"], Value::from(1));
}

#[test]
fn font_flag_renders_alphabet_languages() {
    let dir = tempdir().expect("tempdir should create");
    write_source(&dir.path().join("in.png"));
    let font = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts/DejaVuSansMono.ttf");
    let font = font.to_str().expect("fixture path should be utf-8");

    let output = run_glyphtint(
        dir.path(),
        &[
            "--input",
            "in.png",
            "--output",
            "out.png",
            "--language",
            "english",
            "--font",
            font,
            "--num_cols",
            "8",
            "--json",
        ],
    );
    assert!(
        output.status.success(),
        "render should succeed: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("json should parse");
    assert_eq!(parsed["report"]["ramp_len"], Value::from(52));
    assert_eq!(parsed["report"]["scale"], Value::from(2));
    assert!(dir.path().join("out.png").exists());
}

#[test]
fn help_explains_which_languages_need_a_font() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_glyphtint(dir.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("needs a font file"), "{stdout}");
}
