//! Error types and context management for catalog loading and solver runs

use std::fmt;
use std::path::PathBuf;

/// Main error type for all solver operations
///
/// A contradiction during propagation is deliberately absent: it is a run
/// outcome, reported through `StepResult` and `RunOutcome`.
#[derive(Debug)]
pub enum WfcError {
    /// Prototype source data is malformed or incomplete
    DataFormat {
        /// Prototype the problem was found in, when known
        prototype: Option<String>,
        /// Description of what's wrong with the data
        reason: String,
    },

    /// Cell access outside the configured grid bounds
    OutOfBounds {
        /// Requested coordinates (x, y, z)
        coord: [usize; 3],
        /// Grid dimensions (x, y, z)
        size: [usize; 3],
    },

    /// Prototype id that is not part of the catalog
    UnknownPrototype {
        /// The id that failed to resolve
        id: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Solver state broke one of its own guarantees
    InvariantViolation {
        /// Description of the broken guarantee
        reason: String,
    },

    /// Failed to serialize placements to JSON
    Serialization {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying serializer error
        source: serde_json::Error,
    },

    /// Failed to save a preview image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for WfcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataFormat {
                prototype: Some(id),
                reason,
            } => {
                write!(f, "Invalid prototype data for '{id}': {reason}")
            }
            Self::DataFormat {
                prototype: None,
                reason,
            } => {
                write!(f, "Invalid prototype data: {reason}")
            }
            Self::OutOfBounds { coord, size } => {
                write!(
                    f,
                    "Cell ({}, {}, {}) is outside the grid ({}x{}x{})",
                    coord[0], coord[1], coord[2], size[0], size[1], size[2]
                )
            }
            Self::UnknownPrototype { id } => {
                write!(f, "Unknown prototype '{id}'")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvariantViolation { reason } => {
                write!(f, "Solver invariant violated: {reason}")
            }
            Self::Serialization { path, source } => {
                write!(
                    f,
                    "Failed to write placements to '{}': {source}",
                    path.display()
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for WfcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization { source, .. } => Some(source),
            Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for solver results
pub type Result<T> = std::result::Result<T, WfcError>;

/// Attaches the offending prototype id to data-format errors
pub trait WithPrototype<T> {
    /// Name the prototype a data-format error belongs to
    ///
    /// Errors that already name a prototype, and other error kinds, pass
    /// through unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the original error with the prototype id applied
    fn for_prototype(self, id: &str) -> Result<T>;
}

impl<T> WithPrototype<T> for Result<T> {
    fn for_prototype(self, id: &str) -> Result<T> {
        self.map_err(|mut error| {
            if let WfcError::DataFormat { prototype, .. } = &mut error
                && prototype.is_none()
            {
                *prototype = Some(id.to_string());
            }
            error
        })
    }
}

impl From<image::ImageError> for WfcError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageExport {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for WfcError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create a data-format error not yet tied to a prototype
pub fn data_format(reason: &impl ToString) -> WfcError {
    WfcError::DataFormat {
        prototype: None,
        reason: reason.to_string(),
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> WfcError {
    WfcError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invariant violation error
pub fn invariant_violation(reason: &impl ToString) -> WfcError {
    WfcError::InvariantViolation {
        reason: reason.to_string(),
    }
}
