//! # ImgCarve
//!
//! Converts raster images into NC/G-code programs for 3-axis CNC routers.
//!
//! ## Architecture
//!
//! ImgCarve is organized as a workspace with multiple crates:
//!
//! 1. **imgcarve-core** - Geometry, heightmap and instruction types, error taxonomy
//! 2. **imgcarve-camtools** - Feature extraction, path building, simplification, NC generation
//! 3. **imgcarve-settings** - Configuration files and validation
//! 4. **imgcarve** - Pipeline orchestration and the command-line binary
//!
//! ## Modes
//!
//! - **Edge**: Trace color boundaries and carve them as outlines
//! - **Centerline**: Thin line art to a skeleton and carve along its center
//! - **Heightmap**: Raster-carve the image with depth following brightness

use anyhow::Context;
use clap::ValueEnum;
use imgcarve_camtools::{
    build_heightmap, build_paths, compress, extract_centerline_points, extract_edge_points,
    open_image, NcGenerator, WriterSink,
};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

pub use imgcarve_core::{Error, Result};
pub use imgcarve_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log filter from `RUST_LOG`, falling back to `info` when it is unset or invalid
pub fn log_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatting on stderr, so G-code never mixes with log output
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let env_filter = log_filter();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Carving strategy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Outline color boundaries
    Edge,
    /// Follow the skeleton of line art
    Centerline,
    /// Raster-carve brightness as depth
    Heightmap,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Edge => write!(f, "edge"),
            Mode::Centerline => write!(f, "centerline"),
            Mode::Heightmap => write!(f, "heightmap"),
        }
    }
}

/// Counts reported after a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode: Mode,
    /// Feature points found (0 in heightmap mode)
    pub feature_points: usize,
    /// Paths carved (0 in heightmap mode)
    pub paths: usize,
    /// Isolated points left out of any path
    pub dropped_stubs: usize,
    /// Instructions compiled
    pub instructions: usize,
    /// Lines written to the output file
    pub lines_written: usize,
    /// Estimated machining time
    pub estimated_time: Duration,
}

/// Run the full pipeline on one image and write the program to `output`
pub fn run(config: &Config, mode: Mode, input: &Path, output: &Path) -> anyhow::Result<RunSummary> {
    config.validate().context("Invalid configuration")?;

    let image = open_image(input)
        .with_context(|| format!("Failed to open image {}", input.display()))?;
    let mut generator = NcGenerator::new(config.to_machine_config())?;
    generator.comment(format!("Mode: {}", mode));

    let mut summary = RunSummary {
        mode,
        feature_points: 0,
        paths: 0,
        dropped_stubs: 0,
        instructions: 0,
        lines_written: 0,
        estimated_time: Duration::ZERO,
    };

    match mode {
        Mode::Edge | Mode::Centerline => {
            let built = if mode == Mode::Edge {
                let points = extract_edge_points(&image, &config.to_edge_options())?;
                summary.feature_points = points.len();
                build_paths(&points, None, config.extraction.neighbor_radius)?
            } else {
                let skeleton = extract_centerline_points(&image, &config.to_centerline_options())?;
                summary.feature_points = skeleton.points.len();
                build_paths(
                    &skeleton.points,
                    Some(&skeleton.adjacency),
                    config.extraction.neighbor_radius,
                )?
            };
            summary.dropped_stubs = built.dropped_stubs.len();

            let paths = compress(built.paths, config.simplification.tolerance_pixels)?;
            summary.paths = paths.len();
            if paths.is_empty() {
                warn!("No carvable paths found in {}", input.display());
            }

            match config.carve.depth_step_mm {
                Some(step) => generator.carve_paths_multipass(&paths, config.carve.depth_mm, step)?,
                None => generator.carve_paths(&paths, config.carve.depth_mm)?,
            }
        }
        Mode::Heightmap => {
            let heightmap = build_heightmap(&image, &config.to_heightmap_options())?;
            let h = &config.heightmap;
            generator.carve_heightmap(&heightmap, h.min_depth_mm, h.max_depth_mm, h.both_directions)?;
        }
    }
    drop(image);

    summary.instructions = generator.instructions().len();
    summary.estimated_time = generator.estimate_time();

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file {}", output.display()))?;
    let mut sink = WriterSink::new(BufWriter::new(file));
    generator.export(&mut sink)?;
    summary.lines_written = sink.lines_written();

    info!(
        "{} mode: {} points, {} paths, {} stubs dropped, {} instructions, {} lines, ~{:.1} min",
        summary.mode,
        summary.feature_points,
        summary.paths,
        summary.dropped_stubs,
        summary.instructions,
        summary.lines_written,
        summary.estimated_time.as_secs_f64() / 60.0
    );
    Ok(summary)
}
