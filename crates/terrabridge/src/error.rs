//! Error types for the terrabridge crate.

use std::fmt;

use terrabridge_mesh::MeshError;

/// Result type for terrabridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in terrabridge operations.
///
/// Not-found conditions (removing or toggling an identifier that is not
/// live) are logged and reported through boolean returns instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Mesh preparation failed.
    Mesh(MeshError),
    /// An add arrived for an identifier that is already live.
    DuplicateObject {
        /// The identifier.
        id: String,
    },
    /// A camera operation was requested with no camera bound.
    NoCameraBound,
    /// A non-interruptible transition is still running.
    TransitionNotInterruptible,
    /// A configuration value is out of range.
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// The API key is not 32 lowercase hex characters.
    InvalidApiKey,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mesh(e) => write!(f, "mesh error: {e}"),
            Error::DuplicateObject { id } => {
                write!(f, "object '{id}' is already live")
            }
            Error::NoCameraBound => write!(f, "no camera is bound to the map"),
            Error::TransitionNotInterruptible => {
                write!(f, "current camera transition cannot be interrupted")
            }
            Error::InvalidConfig { field, detail } => {
                write!(f, "invalid config {field}: {detail}")
            }
            Error::InvalidApiKey => {
                write!(f, "api key must be 32 lowercase hexadecimal characters")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Mesh(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MeshError> for Error {
    fn from(e: MeshError) -> Self {
        Error::Mesh(e)
    }
}
