//! Feature Point Extraction
//!
//! Scans an image source and produces candidate feature points in one of two modes:
//!
//! - **Edge mode** emits every foreground pixel that borders a different color.
//!   A pixel is foreground when it is not similar to the configured background,
//!   and pixels outside the image read as background, so shapes touching the
//!   border still get a closed outline. Every point lies on the inner side of
//!   the boundary.
//! - **Centerline mode** binarizes the image, thins the foreground to a
//!   one-pixel-wide skeleton and emits the surviving pixels together with their
//!   8-neighbor adjacency.
//!
//! Thinning follows the two-subiteration Zhang-Suen scheme. Candidates for each
//! subiteration are chosen from a snapshot of the mask; each candidate is then
//! re-checked against the live mask before it is erased (it must still have at
//! least two foreground neighbors and a Yokoi 8-connectivity number of one).
//! The re-check keeps two-pixel-thick strokes and 2x2 blocks from vanishing and
//! makes every erased pixel a simple point, so the number of connected regions
//! never changes.

use crate::image_source::{checked_color_at, validate_source, Color, ImageSource};
use imgcarve_core::{Adjacency, Point, PointSet, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Pixel neighborhood used when comparing colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Neighborhood {
    /// North, east, south, west
    #[default]
    Four,
    /// All eight surrounding pixels
    Eight,
}

impl Neighborhood {
    fn offsets(&self) -> &'static [(i64, i64)] {
        const FOUR: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        const EIGHT: [(i64, i64); 8] = [
            (0, -1),
            (1, -1),
            (1, 0),
            (1, 1),
            (0, 1),
            (-1, 1),
            (-1, 0),
            (-1, -1),
        ];
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
        }
    }
}

/// Edge mode parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeOptions {
    /// Neighborhood compared against each pixel
    pub neighborhood: Neighborhood,
    /// Colors closer than this (RGB Euclidean distance) are treated as equal
    pub similarity_threshold: f64,
    /// Implicit color outside the image and of non-feature pixels
    pub background: Color,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        Self {
            neighborhood: Neighborhood::Four,
            similarity_threshold: 32.0,
            background: Color::WHITE,
        }
    }
}

/// Centerline mode parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterlineOptions {
    /// Pixels darker than this luminance are foreground
    pub luminance_threshold: u8,
    /// Treat light pixels as foreground instead
    pub invert: bool,
    /// Drop diagonal links already bridged by a shared 4-neighbor
    pub prune_diagonal_shortcuts: bool,
}

impl Default for CenterlineOptions {
    fn default() -> Self {
        Self {
            luminance_threshold: 128,
            invert: false,
            prune_diagonal_shortcuts: true,
        }
    }
}

/// Extract edge feature points from an image
pub fn extract_edge_points<I: ImageSource + ?Sized>(
    image: &I,
    options: &EdgeOptions,
) -> Result<PointSet> {
    validate_source(image)?;

    let width = image.width() as i64;
    let height = image.height() as i64;
    let threshold = options.similarity_threshold;
    let mut points = PointSet::new();

    for y in 0..height {
        for x in 0..width {
            let color = checked_color_at(image, x as u32, y as u32)?;
            if color.distance(&options.background) <= threshold {
                continue;
            }

            let mut on_edge = false;
            for (dx, dy) in options.neighborhood.offsets() {
                let (nx, ny) = (x + dx, y + dy);
                let neighbor = if nx >= 0 && ny >= 0 && nx < width && ny < height {
                    checked_color_at(image, nx as u32, ny as u32)?
                } else {
                    options.background
                };
                if neighbor.distance(&color) > threshold {
                    on_edge = true;
                    break;
                }
            }

            if on_edge {
                points.insert(Point::from_pixel(x as u32, y as u32));
            }
        }
    }

    if points.is_empty() {
        warn!("Edge extraction found no feature points");
    }
    debug!(
        "Edge extraction: {}x{} image -> {} points",
        width,
        height,
        points.len()
    );

    Ok(points)
}

/// Foreground/background raster used during thinning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Mask with `f(x, y)` deciding each pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel value; anything outside the mask is background
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.bits[y as usize * self.width as usize + x as usize] = value;
        }
    }

    /// Number of foreground pixels
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Foreground pixel coordinates in raster order
    pub fn foreground(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    /// The 8 neighbors in Zhang-Suen order: N, NE, E, SE, S, SW, W, NW
    fn ring(&self, x: u32, y: u32) -> [bool; 8] {
        let (x, y) = (x as i64, y as i64);
        [
            self.get(x, y - 1),
            self.get(x + 1, y - 1),
            self.get(x + 1, y),
            self.get(x + 1, y + 1),
            self.get(x, y + 1),
            self.get(x - 1, y + 1),
            self.get(x - 1, y),
            self.get(x - 1, y - 1),
        ]
    }
}

/// Binarize an image by luminance
pub fn binarize<I: ImageSource + ?Sized>(image: &I, options: &CenterlineOptions) -> Result<BinaryMask> {
    validate_source(image)?;
    let threshold = options.luminance_threshold as f64;
    let mut mask = BinaryMask::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            let dark = checked_color_at(image, x, y)?.luminance() < threshold;
            if dark != options.invert {
                mask.set(x, y, true);
            }
        }
    }
    Ok(mask)
}

fn neighbor_count(ring: &[bool; 8]) -> usize {
    ring.iter().filter(|b| **b).count()
}

/// Yokoi connectivity number for 8-connected foreground.
///
/// Equals 1 exactly when removing the center pixel changes neither the
/// number of foreground components nor the number of holes.
fn connectivity_number(ring: &[bool; 8]) -> u8 {
    // Counter-clockwise from east: E, NE, N, NW, W, SW, S, SE
    let order = [2, 1, 0, 7, 6, 5, 4, 3];
    let bg: Vec<u8> = order.iter().map(|&i| u8::from(!ring[i])).collect();
    (0..4)
        .map(|k| {
            let i = 2 * k;
            bg[i] - bg[i] * bg[(i + 1) % 8] * bg[(i + 2) % 8]
        })
        .sum()
}

fn is_candidate(ring: &[bool; 8], subiteration: usize) -> bool {
    let [n, _, e, _, s, _, w, _] = *ring;
    let directional = if subiteration == 0 {
        !(n && e && s) && !(e && s && w)
    } else {
        !(n && e && w) && !(n && s && w)
    };
    let count = neighbor_count(ring);
    directional && (2..=6).contains(&count) && connectivity_number(ring) == 1
}

/// Thin the foreground of `mask` to a one-pixel-wide skeleton in place.
///
/// Returns the number of full iterations run. Each iteration that changes
/// the mask erases at least one pixel, so the loop is bounded by the
/// foreground pixel count.
pub fn thin(mask: &mut BinaryMask) -> usize {
    let mut iterations = 0;
    loop {
        let mut removed = 0;
        for subiteration in 0..2 {
            let candidates: Vec<(u32, u32)> = mask
                .foreground()
                .filter(|&(x, y)| is_candidate(&mask.ring(x, y), subiteration))
                .collect();

            for (x, y) in candidates {
                let ring = mask.ring(x, y);
                if neighbor_count(&ring) >= 2 && connectivity_number(&ring) == 1 {
                    mask.set(x, y, false);
                    removed += 1;
                }
            }
        }
        iterations += 1;
        if removed == 0 {
            break;
        }
    }
    iterations
}

/// Number of 8-connected foreground regions
pub fn count_components(mask: &BinaryMask) -> usize {
    let mut seen = vec![false; mask.bits.len()];
    let width = mask.width as usize;
    let mut components = 0;
    let mut stack = Vec::new();

    for (sx, sy) in mask.foreground() {
        let start = sy as usize * width + sx as usize;
        if seen[start] {
            continue;
        }
        components += 1;
        seen[start] = true;
        stack.push((sx as i64, sy as i64));

        while let Some((x, y)) = stack.pop() {
            for (dx, dy) in Neighborhood::Eight.offsets() {
                let (nx, ny) = (x + dx, y + dy);
                if mask.get(nx, ny) {
                    let idx = ny as usize * width + nx as usize;
                    if !seen[idx] {
                        seen[idx] = true;
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    components
}

/// Centerline extraction result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    /// Every skeleton pixel, including isolated ones
    pub points: PointSet,
    /// 8-neighbor links between skeleton pixels
    pub adjacency: Adjacency,
    /// Skeleton pixels with no neighbors
    pub stubs: Vec<Point>,
}

impl Skeleton {
    /// Build the point set and adjacency from a thinned mask
    pub fn from_mask(mask: &BinaryMask, prune_diagonal_shortcuts: bool) -> Self {
        let mut skeleton = Skeleton::default();

        for (x, y) in mask.foreground() {
            let point = Point::from_pixel(x, y);
            skeleton.points.insert(point);
            skeleton.adjacency.add_node(point);

            let (xi, yi) = (x as i64, y as i64);
            for (dx, dy) in Neighborhood::Eight.offsets() {
                let (nx, ny) = (xi + dx, yi + dy);
                if !mask.get(nx, ny) {
                    continue;
                }
                let diagonal = *dx != 0 && *dy != 0;
                if diagonal
                    && prune_diagonal_shortcuts
                    && (mask.get(nx, yi) || mask.get(xi, ny))
                {
                    continue;
                }
                skeleton
                    .adjacency
                    .add_edge(point, Point::new(nx as f64, ny as f64));
            }
        }

        skeleton.stubs = skeleton
            .points
            .iter()
            .filter(|p| skeleton.adjacency.degree(p) == 0)
            .copied()
            .collect();
        skeleton
    }
}

/// Extract centerline points and their adjacency from line art
pub fn extract_centerline_points<I: ImageSource + ?Sized>(
    image: &I,
    options: &CenterlineOptions,
) -> Result<Skeleton> {
    let mut mask = binarize(image, options)?;
    let foreground = mask.count();
    let iterations = thin(&mut mask);
    let skeleton = Skeleton::from_mask(&mask, options.prune_diagonal_shortcuts);

    if skeleton.points.is_empty() {
        warn!("Centerline extraction found no foreground pixels");
    }
    if !skeleton.stubs.is_empty() {
        warn!(
            "Centerline extraction left {} isolated pixel(s)",
            skeleton.stubs.len()
        );
    }
    debug!(
        "Centerline extraction: {} foreground -> {} skeleton pixels in {} iterations ({} edges)",
        foreground,
        skeleton.points.len(),
        iterations,
        skeleton.adjacency.edge_count()
    );

    Ok(skeleton)
}
