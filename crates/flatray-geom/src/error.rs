//! Error types for primitive construction.

use thiserror::Error;

/// Errors that can occur while constructing a primitive.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// A scalar parameter is out of its valid range.
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// The object-to-world transform cannot be inverted.
    #[error("transform is not invertible")]
    NonInvertibleTransform,

    /// A polygon needs at least three vertices.
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Polygon vertices do not lie in a common plane.
    #[error("polygon vertex {index} is {distance} off the polygon plane")]
    NonPlanar {
        /// Index of the first vertex off the plane.
        index: usize,
        /// Its distance from the plane.
        distance: f32,
    },

    /// The shape has zero area (collinear vertices, zero-length sides, ...).
    #[error("degenerate {0}")]
    Degenerate(&'static str),

    /// A Bézier strand needs `3n + 1` control points.
    #[error("bezier strand needs 3n+1 control points (n >= 1), got {0}")]
    BadStrandLength(usize),
}

/// Result type for primitive construction.
pub type Result<T> = std::result::Result<T, GeomError>;

pub(crate) fn check_positive(name: &'static str, value: f32) -> Result<f32> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(GeomError::InvalidParameter { name, value })
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<f32> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(GeomError::InvalidParameter { name, value })
    }
}
