//! ImgCarve Settings Crate
//!
//! Handles job configuration: loading and saving settings files, validation,
//! and mapping settings onto the pipeline's parameter structs.

pub mod config;
pub mod error;

pub use config::{
    CarveSettings, Config, ExtractionSettings, HeightmapSettings, MachineSettings,
    SimplificationSettings,
};
pub use error::{ConfigError, SettingsError};
