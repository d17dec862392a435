//! Image Source abstraction
//!
//! Read-only pixel access used by feature extraction and heightmap building.
//! Implemented for the `image` crate's buffer types so decoded files can be
//! fed straight into the pipeline.

use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};
use imgcarve_core::{InputError, Result};
use serde::{Deserialize, Serialize};

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Gray level as a color
    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Composite an RGBA pixel over a white page
    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        let alpha = a as f64 / 255.0;
        let blend = |c: u8| (c as f64 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Self::new(blend(r), blend(g), blend(b))
    }

    /// Perceived brightness in `0.0..=255.0` (Rec. 601 weights)
    pub fn luminance(&self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Euclidean distance in RGB space
    pub fn distance(&self, other: &Color) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Read-only raster with per-pixel color access.
///
/// `pixel` returns `None` for coordinates it cannot serve. Pipeline stages
/// read through [`checked_color_at`], which turns that into an input error.
pub trait ImageSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> Option<Color>;
}

/// Reject images with a zero dimension
pub fn validate_source<I: ImageSource + ?Sized>(image: &I) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InputError::InvalidDimensions {
            width: image.width(),
            height: image.height(),
        }
        .into());
    }
    Ok(())
}

/// Pixel access that reports unreadable coordinates as `PixelOutOfRange`
pub fn checked_color_at<I: ImageSource + ?Sized>(image: &I, x: u32, y: u32) -> Result<Color> {
    image.pixel(x, y).ok_or_else(|| {
        InputError::PixelOutOfRange {
            x,
            y,
            width: image.width(),
            height: image.height(),
        }
        .into()
    })
}

impl ImageSource for GrayImage {
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.get_pixel_checked(x, y).map(|p| Color::gray(p.0[0]))
    }
}

impl ImageSource for RgbImage {
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let [r, g, b] = self.get_pixel_checked(x, y)?.0;
        Some(Color::new(r, g, b))
    }
}

impl ImageSource for RgbaImage {
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let [r, g, b, a] = self.get_pixel_checked(x, y)?.0;
        Some(Color::from_rgba(r, g, b, a))
    }
}

impl ImageSource for DynamicImage {
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let [r, g, b, a] = GenericImageView::get_pixel(self, x, y).0;
        Some(Color::from_rgba(r, g, b, a))
    }
}

/// Open and decode an image file
pub fn open_image<P: AsRef<std::path::Path>>(path: P) -> Result<DynamicImage> {
    image::open(path.as_ref()).map_err(|e| imgcarve_core::Error::Image(Box::new(e)))
}
