//! # ImgCarve CAM Tools
//!
//! This crate turns raster images into NC programs for a 3-axis router.
//!
//! ## Pipeline Stages
//!
//! - **Feature Extractor**: Edge points or a thinned centerline skeleton from an image
//! - **Path Builder**: Orders feature points into connected tool strokes
//! - **Path Simplifier**: Ramer-Douglas-Peucker reduction of stroke points
//! - **Heightmap Builder**: Luminance to normalized depth, one sample per pixel
//! - **NC Generator**: Compiles paths and heightmaps into instructions and G-code
//!
//! ## Supporting Infrastructure
//!
//! - **Image Source**: Pixel access over the `image` crate's buffers
//! - **Sink**: Line-oriented program output

pub mod feature_extractor;
pub mod heightmap_builder;
pub mod image_source;
pub mod nc_generator;
pub mod path_builder;
pub mod path_simplifier;
pub mod sink;

// Re-export commonly used items
pub use feature_extractor::{
    binarize, count_components, extract_centerline_points, extract_edge_points, thin, BinaryMask,
    CenterlineOptions, EdgeOptions, Neighborhood, Skeleton,
};
pub use heightmap_builder::{build_heightmap, HeightmapOptions};
pub use image_source::{open_image, Color, ImageSource};
pub use nc_generator::{MachineConfig, NcGenerator};
pub use path_builder::{
    build_centerline_paths, build_edge_paths, build_paths, BuiltPaths, DEFAULT_NEIGHBOR_RADIUS,
};
pub use path_simplifier::{compress, compress_path};
pub use sink::{Sink, WriterSink};
