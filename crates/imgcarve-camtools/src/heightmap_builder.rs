//! Heightmap Builder
//!
//! Maps pixel luminance straight to normalized depth, one sample per pixel.

use crate::image_source::{checked_color_at, validate_source, ImageSource};
use imgcarve_core::{Heightmap, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Luminance to depth mapping options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeightmapOptions {
    /// Map black to 1.0 and white to 0.0 instead of the other way round
    pub invert: bool,
}

/// Build a heightmap with the same dimensions as `image`
pub fn build_heightmap<I: ImageSource + ?Sized>(
    image: &I,
    options: &HeightmapOptions,
) -> Result<Heightmap> {
    validate_source(image)?;

    let mut samples = Vec::with_capacity(image.width() as usize * image.height() as usize);
    for y in 0..image.height() {
        for x in 0..image.width() {
            let level = (checked_color_at(image, x, y)?.luminance() / 255.0).clamp(0.0, 1.0);
            samples.push(if options.invert { 1.0 - level } else { level });
        }
    }
    let heightmap = Heightmap::from_samples(image.width(), image.height(), samples)?;

    debug!(
        "Built {}x{} heightmap (invert: {})",
        heightmap.width(),
        heightmap.height(),
        options.invert
    );
    Ok(heightmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_shape_matches_image() {
        let img = GrayImage::from_fn(7, 3, |x, _| Luma([(x * 30) as u8]));
        let map = build_heightmap(&img, &HeightmapOptions::default()).unwrap();
        assert_eq!(map.width(), 7);
        assert_eq!(map.height(), 3);
        assert!(map.samples().iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_black_and_white_extremes() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { Luma([0]) } else { Luma([255]) });
        let map = build_heightmap(&img, &HeightmapOptions::default()).unwrap();
        assert_eq!(map.sample(0, 0), Some(0.0));
        assert!((map.sample(1, 0).unwrap() - 1.0).abs() < 1e-9);

        let inverted = build_heightmap(&img, &HeightmapOptions { invert: true }).unwrap();
        assert_eq!(inverted.sample(0, 0), Some(1.0));
        assert!(inverted.sample(1, 0).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = GrayImage::new(0, 0);
        assert!(build_heightmap(&img, &HeightmapOptions::default()).is_err());
    }
}
