//! Error types for mesh preparation.

use std::fmt;

/// Errors that can occur while preparing a raw mesh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The per-chunk vertex limit cannot hold a single triangle.
    InvalidChunkLimit { limit: usize },
    /// The index buffer does not describe whole triangles.
    InvalidIndexCount { count: usize },
    /// A triangle index refers past the end of the vertex buffer.
    IndexOutOfBounds { index: usize, len: usize },
    /// A per-vertex attribute buffer does not match the vertex count.
    AttributeLengthMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The identifier does not map to a known geometry bucket.
    UnknownGeometryPrefix { id: String },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChunkLimit { limit } => {
                write!(f, "chunk vertex limit {limit} cannot hold a triangle")
            }
            Self::InvalidIndexCount { count } => {
                write!(f, "index count {count} is not a multiple of three")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for {len} vertices")
            }
            Self::AttributeLengthMismatch {
                attribute,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "attribute {attribute} has {actual} entries, expected {expected}"
                )
            }
            Self::UnknownGeometryPrefix { id } => {
                write!(f, "unrecognised geometry identifier prefix in '{id}'")
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// Result type for mesh preparation.
pub type MeshResult<T> = Result<T, MeshError>;
