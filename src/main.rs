use anyhow::Context;
use clap::Parser;
use imgcarve::{init_logging, run, Config, Mode, BUILD_DATE, VERSION};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "imgcarve")]
#[command(about = "Convert raster images into G-code for 3-axis CNC routers")]
#[command(version = VERSION, long_version = LONG_VERSION)]
struct Cli {
    /// Carving strategy
    #[arg(value_enum)]
    mode: Mode,

    /// Input image (PNG, JPEG, BMP, ...)
    input: PathBuf,

    /// Output G-code file
    output: PathBuf,

    /// Config file (.toml or .json); defaults to the user config file when present
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match Config::default_path() {
        Ok(path) if path.exists() => {
            info!("Using config {}", path.display());
            Config::load_from_file(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        _ => Ok(Config::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging()?;
    debug!("imgcarve {} (built {})", VERSION, BUILD_DATE);

    let config = load_config(cli.config.as_ref())?;
    let summary = run(&config, cli.mode, &cli.input, &cli.output)?;
    println!(
        "Wrote {} ({} lines, {} paths, ~{:.1} min)",
        cli.output.display(),
        summary.lines_written,
        summary.paths,
        summary.estimated_time.as_secs_f64() / 60.0
    );
    Ok(())
}
