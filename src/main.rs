use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use glyphtint::canvas::Background;
use glyphtint::config::{load_profile, RenderConfig};
use glyphtint::error_codes::envelope_for;
use glyphtint::pipeline::run_file_conversion;
use glyphtint::sidecar::write_sidecar;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GLYPHTINT_GIT_HASH"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "glyphtint")]
#[command(about = "Render a photograph as colour-tinted character art")]
#[command(version = VERSION)]
struct Cli {
    /// Source image
    #[arg(long)]
    input: PathBuf,
    /// Destination image; format follows the extension
    #[arg(long)]
    output: PathBuf,
    /// Character ramp language [default: chinese]. Only `general` renders
    /// without --font; every other language needs a font file
    #[arg(long)]
    language: Option<String>,
    /// Ramp variant [default: standard]
    #[arg(long)]
    mode: Option<String>,
    /// Canvas background and crop policy [default: black]
    #[arg(long, value_enum)]
    background: Option<Background>,
    /// Requested grid columns [default: 300]
    #[arg(long = "num_cols", visible_alias = "num-cols")]
    num_cols: Option<u32>,
    /// Aspect correction for cell and canvas height [default: from language]
    #[arg(long)]
    scale: Option<u32>,
    /// Saturation multiplier [default: 1.5]
    #[arg(long, allow_hyphen_values = true)]
    saturation: Option<f64>,
    /// Brightness multiplier [default: 1.5]
    #[arg(long, allow_hyphen_values = true)]
    brightness: Option<f64>,
    /// TrueType/OpenType font for the ramp characters
    #[arg(long)]
    font: Option<PathBuf>,
    /// Font size in pixels [default: from language]
    #[arg(long = "font-size")]
    font_size: Option<f32>,
    /// YAML render profile; flags given on the command line win
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Use alphabet ramps as listed instead of ordering them by glyph coverage
    #[arg(long)]
    keep_ramp_order: bool,
    /// Also write <output>.json with the render report and artifact hash
    #[arg(long)]
    sidecar: bool,
    /// Print the report (or error envelope) as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = RenderConfig::default();
        if let Some(path) = &self.profile {
            config = config.with_profile(&load_profile(path)?);
        }

        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(mode) = &self.mode {
            config.mode = mode.clone();
        }
        if let Some(background) = self.background {
            config.background = background;
        }
        if let Some(num_cols) = self.num_cols {
            config.num_cols = num_cols;
        }
        if self.scale.is_some() {
            config.scale = self.scale;
        }
        if let Some(saturation) = self.saturation {
            config.saturation = saturation;
        }
        if let Some(brightness) = self.brightness {
            config.brightness = brightness;
        }
        if let Some(font) = &self.font {
            config.font = Some(font.clone());
        }
        if self.font_size.is_some() {
            config.font_size = self.font_size;
        }
        if self.keep_ramp_order {
            config.density_order = false;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json_output = cli.json;

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if json_output {
                match serde_json::to_string(&envelope_for(&error)) {
                    Ok(envelope) => println!("{envelope}"),
                    Err(_) => eprintln!("error: {error:#}"),
                }
            } else {
                eprintln!("error: {error:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glyphtint=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.render_config()?;
    let report = run_file_conversion(&cli.input, &cli.output, &config)?;

    let sidecar = if cli.sidecar {
        Some(write_sidecar(&cli.input, &cli.output, &config, &report)?)
    } else {
        None
    };

    if cli.json {
        let summary = json!({
            "ok": true,
            "output": cli.output.display().to_string(),
            "sidecar": sidecar.as_ref().map(|path| path.display().to_string()),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Wrote {} ({}x{}, {}x{} cells)",
            cli.output.display(),
            report.output_width,
            report.output_height,
            report.grid.num_cols,
            report.grid.num_rows
        );
        if let Some(path) = sidecar {
            println!("Sidecar {}", path.display());
        }
    }
    Ok(())
}
