//! Configuration and settings management for ImgCarve
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats; the default location is in the
//! platform-specific config directory.
//!
//! Configuration is organized into logical sections:
//! - Machine settings (scale, bit, speeds, output precision)
//! - Feature extraction (edge and centerline thresholds)
//! - Path simplification
//! - Heightmap carving (depth bounds, scan direction)
//! - Path carving (depth, optional multi-pass step)

use crate::error::{ConfigError, Result, SettingsError};
use imgcarve_camtools::{
    CenterlineOptions, Color, EdgeOptions, HeightmapOptions, MachineConfig, Neighborhood,
    DEFAULT_NEIGHBOR_RADIUS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Machine and output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Millimeters per source pixel
    pub mm_per_pixel: f64,
    /// Bit width in source pixels
    pub bit_diameter_pixels: f64,
    /// Hover height between cuts (mm)
    pub safe_height_mm: f64,
    /// Spindle speed (RPM)
    pub spindle_speed: f64,
    /// Vertical feed rate (mm/min)
    pub plunge_rate: f64,
    /// Cutting feed rate (mm/min)
    pub feed_rate: f64,
    /// Rapid travel rate used for time estimates (mm/min)
    pub travel_rate: f64,
    /// Skip feed moves shorter than this (mm)
    pub min_move_distance_mm: f64,
    /// Digits after the decimal point in emitted coordinates
    pub decimal_places: usize,
    /// Emit a descriptive comment header
    pub emit_header: bool,
}

impl Default for MachineSettings {
    fn default() -> Self {
        let machine = MachineConfig::default();
        Self {
            mm_per_pixel: machine.mm_per_pixel,
            bit_diameter_pixels: machine.bit_diameter_pixels,
            safe_height_mm: machine.safe_height,
            spindle_speed: machine.spindle_speed,
            plunge_rate: machine.plunge_rate,
            feed_rate: machine.feed_rate,
            travel_rate: machine.travel_rate,
            min_move_distance_mm: machine.min_move_distance,
            decimal_places: machine.decimal_places,
            emit_header: machine.emit_header,
        }
    }
}

/// Feature extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Neighborhood used by edge detection
    pub neighborhood: Neighborhood,
    /// RGB distance under which two colors count as equal
    pub similarity_threshold: f64,
    /// Background color for edge detection
    pub background: Color,
    /// Luminance under which a pixel is foreground in centerline mode
    pub luminance_threshold: u8,
    /// Treat light pixels as foreground in centerline mode
    pub invert_foreground: bool,
    /// Drop skeleton diagonals bridged by a 4-neighbor
    pub prune_diagonal_shortcuts: bool,
    /// Largest step between consecutive edge points (px)
    pub neighbor_radius: f64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let edge = EdgeOptions::default();
        let centerline = CenterlineOptions::default();
        Self {
            neighborhood: edge.neighborhood,
            similarity_threshold: edge.similarity_threshold,
            background: edge.background,
            luminance_threshold: centerline.luminance_threshold,
            invert_foreground: centerline.invert,
            prune_diagonal_shortcuts: centerline.prune_diagonal_shortcuts,
            neighbor_radius: DEFAULT_NEIGHBOR_RADIUS,
        }
    }
}

/// Path simplification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplificationSettings {
    /// Maximum deviation of a removed point from the simplified path (px)
    pub tolerance_pixels: f64,
}

impl Default for SimplificationSettings {
    fn default() -> Self {
        Self {
            tolerance_pixels: 0.5,
        }
    }
}

/// Heightmap carving settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapSettings {
    /// Map dark pixels to deep cuts
    pub invert: bool,
    /// Depth for normalized sample 0 (mm)
    pub min_depth_mm: f64,
    /// Depth for normalized sample 1 (mm)
    pub max_depth_mm: f64,
    /// Alternate scan direction per row
    pub both_directions: bool,
}

impl Default for HeightmapSettings {
    fn default() -> Self {
        Self {
            invert: false,
            min_depth_mm: 0.0,
            max_depth_mm: 2.0,
            both_directions: true,
        }
    }
}

/// Path carving settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveSettings {
    /// Final cut depth (mm)
    pub depth_mm: f64,
    /// Depth per pass; a single full-depth pass when unset (mm)
    pub depth_step_mm: Option<f64>,
}

impl Default for CarveSettings {
    fn default() -> Self {
        Self {
            depth_mm: 2.0,
            depth_step_mm: None,
        }
    }
}

/// Complete job configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Machine and output settings
    pub machine: MachineSettings,
    /// Feature extraction settings
    pub extraction: ExtractionSettings,
    /// Path simplification settings
    pub simplification: SimplificationSettings,
    /// Heightmap carving settings
    pub heightmap: HeightmapSettings,
    /// Path carving settings
    pub carve: CarveSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnsupportedFormat(format!(
            "{} (config file must be .json or .toml)",
            path.display()
        ))
        .into()),
    }
}

fn out_of_range(key: &str, value: impl ToString) -> SettingsError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/imgcarve/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no config directory on this platform".to_string())
        })?;
        path.push("imgcarve");
        path.push("config.toml");
        Ok(path)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        // Machine parameters share the generator's own checks
        self.to_machine_config().validate()?;

        let extraction = &self.extraction;
        if !(extraction.similarity_threshold.is_finite() && extraction.similarity_threshold >= 0.0)
        {
            return Err(out_of_range(
                "extraction.similarity_threshold",
                extraction.similarity_threshold,
            ));
        }
        if !(extraction.neighbor_radius.is_finite() && extraction.neighbor_radius > 0.0) {
            return Err(out_of_range(
                "extraction.neighbor_radius",
                extraction.neighbor_radius,
            ));
        }

        let tolerance = self.simplification.tolerance_pixels;
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(out_of_range("simplification.tolerance_pixels", tolerance));
        }

        let heightmap = &self.heightmap;
        if !(heightmap.min_depth_mm.is_finite() && heightmap.min_depth_mm >= 0.0) {
            return Err(out_of_range("heightmap.min_depth_mm", heightmap.min_depth_mm));
        }
        if !(heightmap.max_depth_mm.is_finite() && heightmap.max_depth_mm >= heightmap.min_depth_mm)
        {
            return Err(out_of_range("heightmap.max_depth_mm", heightmap.max_depth_mm));
        }

        if !(self.carve.depth_mm.is_finite() && self.carve.depth_mm >= 0.0) {
            return Err(out_of_range("carve.depth_mm", self.carve.depth_mm));
        }
        if let Some(step) = self.carve.depth_step_mm {
            if !(step.is_finite() && step > 0.0) {
                return Err(out_of_range("carve.depth_step_mm", step));
            }
        }

        Ok(())
    }

    /// Generator parameters
    pub fn to_machine_config(&self) -> MachineConfig {
        let m = &self.machine;
        MachineConfig {
            mm_per_pixel: m.mm_per_pixel,
            bit_diameter_pixels: m.bit_diameter_pixels,
            safe_height: m.safe_height_mm,
            spindle_speed: m.spindle_speed,
            plunge_rate: m.plunge_rate,
            feed_rate: m.feed_rate,
            travel_rate: m.travel_rate,
            min_move_distance: m.min_move_distance_mm,
            decimal_places: m.decimal_places,
            emit_header: m.emit_header,
        }
    }

    /// Edge-mode extraction parameters
    pub fn to_edge_options(&self) -> EdgeOptions {
        EdgeOptions {
            neighborhood: self.extraction.neighborhood,
            similarity_threshold: self.extraction.similarity_threshold,
            background: self.extraction.background,
        }
    }

    /// Centerline-mode extraction parameters
    pub fn to_centerline_options(&self) -> CenterlineOptions {
        CenterlineOptions {
            luminance_threshold: self.extraction.luminance_threshold,
            invert: self.extraction.invert_foreground,
            prune_diagonal_shortcuts: self.extraction.prune_diagonal_shortcuts,
        }
    }

    /// Heightmap builder parameters
    pub fn to_heightmap_options(&self) -> HeightmapOptions {
        HeightmapOptions {
            invert: self.heightmap.invert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.machine.mm_per_pixel, 0.1);
        assert_eq!(config.extraction.neighborhood, Neighborhood::Four);
        assert_eq!(config.carve.depth_step_mm, None);
    }

    #[test]
    fn test_inverted_depth_range_rejected() {
        let mut config = Config::new();
        config.heightmap.min_depth_mm = 3.0;
        config.heightmap.max_depth_mm = 1.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_machine_errors_come_from_generator_checks() {
        let mut config = Config::new();
        config.machine.bit_diameter_pixels = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::Pipeline(_)))
        ));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [machine]
            mm_per_pixel = 0.25

            [carve]
            depth_step_mm = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.machine.mm_per_pixel, 0.25);
        assert_eq!(config.machine.feed_rate, 750.0);
        assert_eq!(config.carve.depth_step_mm, Some(0.5));
        assert_eq!(config.carve.depth_mm, 2.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::new().save_to_file(Path::new("config.yaml")).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_option_mapping() {
        let mut config = Config::new();
        config.extraction.invert_foreground = true;
        config.extraction.neighborhood = Neighborhood::Eight;
        config.machine.safe_height_mm = 5.0;

        assert!(config.to_centerline_options().invert);
        assert_eq!(config.to_edge_options().neighborhood, Neighborhood::Eight);
        assert_eq!(config.to_machine_config().safe_height, 5.0);
    }
}
