//! Error handling for ImgCarve
//!
//! Provides the error taxonomy shared by every pipeline stage:
//! - Input errors (image dimensions, pixel access)
//! - Topology errors (malformed centerline adjacency)
//! - Configuration errors (machine and carving parameters)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Degenerate inputs (empty point sets, single-pixel stubs, empty heightmaps)
//! are not errors; stages report them through `tracing` diagnostics instead.

use crate::geometry::Point;
use thiserror::Error;

/// Input error type
///
/// Raised when the image source cannot be processed at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// Image has a zero dimension
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Reported image width.
        width: u32,
        /// Reported image height.
        height: u32,
    },

    /// A pixel outside the image was requested
    #[error("Pixel ({x}, {y}) out of range for {width}x{height} image")]
    PixelOutOfRange {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
}

/// Topology error type
///
/// Raised when a centerline adjacency graph does not describe its point set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// A point lists a neighbor that is not part of the point set
    #[error("Point {point} claims neighbor {neighbor} which is not in the point set")]
    MissingNeighbor {
        /// The point owning the adjacency entry.
        point: Point,
        /// The neighbor that could not be found.
        neighbor: Point,
    },

    /// The adjacency has an entry for a point outside the point set
    #[error("Adjacency entry for unknown point {point}")]
    UnknownNode {
        /// The offending point.
        point: Point,
    },
}

/// Configuration error type
///
/// Raised at generator construction or invocation. Values are never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Unit scale must be strictly positive
    #[error("Unit scale must be > 0 (got {0})")]
    NonPositiveScale(f64),

    /// Tool bit width must be strictly positive
    #[error("Bit diameter must be > 0 pixels (got {0})")]
    NonPositiveBitDiameter(f64),

    /// Heightmap depth range is inverted
    #[error("Minimum depth {min} exceeds maximum depth {max}")]
    InvertedDepthRange {
        /// Requested minimum depth.
        min: f64,
        /// Requested maximum depth.
        max: f64,
    },

    /// Cut depth below the stock surface cannot be negative
    #[error("Depth must be >= 0 (got {0})")]
    NegativeDepth(f64),

    /// Multi-pass step must advance
    #[error("Depth step must be > 0 (got {0})")]
    NonPositiveDepthStep(f64),

    /// Simplification tolerance must not be negative
    #[error("Tolerance must be >= 0 (got {0})")]
    NegativeTolerance(f64),

    /// Any other out-of-range parameter
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Main error type for ImgCarve
///
/// A unified error type that can represent any error from all stages.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Input error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Topology error
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Input(_))
    }

    /// Check if this is a topology error
    pub fn is_topology_error(&self) -> bool {
        matches!(self, Error::Topology(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
