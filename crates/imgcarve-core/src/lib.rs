//! # ImgCarve Core
//!
//! Core types and the error taxonomy for ImgCarve.
//! Provides the data model passed between pipeline stages: feature points,
//! centerline adjacency, paths, heightmaps and tool-motion instructions.

pub mod error;
pub mod geometry;
pub mod heightmap;
pub mod instruction;

pub use error::{ConfigurationError, Error, InputError, Result, TopologyError};
pub use geometry::{Adjacency, Path, PathCollection, Point, PointSet};
pub use heightmap::Heightmap;
pub use instruction::{Instruction, ToolState};
