//! Error types for scene compilation and configuration.

use flatray_geom::{GeomError, ShapeKind};
use thiserror::Error;

/// Errors that can occur while building or compiling a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// More instances of one kind than a 16-bit offset can address.
    #[error("too many {kind} primitives: {count} (max {max})")]
    TableOverflow {
        /// Kind whose table overflowed.
        kind: ShapeKind,
        /// Instances requested.
        count: usize,
        /// Addressable maximum.
        max: usize,
    },

    /// The shared BVH word buffer or triangle table outgrew `i32` offsets.
    #[error("BVH buffer overflow: {0} words")]
    BvhOverflow(usize),

    /// The shared polygon vertex pool outgrew exact `f32` indexing.
    #[error("polygon vertex pool overflow: {0} vertices")]
    VertexPoolOverflow(usize),

    /// A mesh face references a vertex that does not exist.
    #[error("mesh face {face} references vertex {index} of {vertex_count}")]
    VertexIndex {
        /// Face index.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Vertices available.
        vertex_count: usize,
    },

    /// Invalid primitive geometry.
    #[error(transparent)]
    Geometry(#[from] GeomError),
}

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML text did not parse or did not match the schema.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid config value `{key}`: {reason}")]
    Invalid {
        /// Dotted key path.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for scene compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
