//! Error types for coverage_planning

use std::fmt;

/// Main error type for map loading, configuration and persistence
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// Raster missing, undecodable, or with zero width/height
    #[error("Map load error: {0}")]
    LoadError(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for coverage operations
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Reason a waypoint was refused by the store.
///
/// Never propagated as an error: callers either inspect it or collapse it to
/// a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRejection {
    /// Coordinates fall outside `[0, width) x [0, height)`
    OutOfBounds,
    /// The containing cell is blocked
    NotNavigable,
}

impl fmt::Display for WaypointRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaypointRejection::OutOfBounds => write!(f, "waypoint is outside the map"),
            WaypointRejection::NotNavigable => {
                write!(f, "cannot place waypoint on border or non-navigable area")
            }
        }
    }
}
