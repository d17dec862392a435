//! Dense elevation field
//!
//! One normalized depth sample per source pixel, stored row-major.
//! Samples are always within `[0, 1]`; physical depths are only assigned
//! when the generator interpolates between a minimum and maximum depth.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Row-major grid of normalized depth samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heightmap {
    width: u32,
    height: u32,
    samples: Vec<f64>,
}

impl Heightmap {
    /// Build a heightmap from row-major samples.
    ///
    /// Fails if the sample count does not match the dimensions or any
    /// sample lies outside `[0, 1]`.
    pub fn from_samples(
        width: u32,
        height: u32,
        samples: Vec<f64>,
    ) -> Result<Self, ConfigurationError> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(ConfigurationError::InvalidValue {
                name: "heightmap".to_string(),
                reason: format!(
                    "expected {} samples for {}x{}, got {}",
                    expected,
                    width,
                    height,
                    samples.len()
                ),
            });
        }
        if let Some(bad) = samples.iter().find(|s| !(0.0..=1.0).contains(*s)) {
            return Err(ConfigurationError::InvalidValue {
                name: "heightmap".to_string(),
                reason: format!("sample {} outside [0, 1]", bad),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `(x, y)`, or `None` outside the grid
    pub fn sample(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// One row of samples, left to right
    pub fn row(&self, y: u32) -> Option<&[f64]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        self.samples.get(start..start + self.width as usize)
    }

    /// All samples in row-major order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}
