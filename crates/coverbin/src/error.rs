//! Error types for configuration.
//!
//! Geometry construction itself is total; only the configuration boundary
//! can fail.

use thiserror::Error;

/// Errors raised while turning user input into [`crate::BuildParameters`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An enumerated option got a value outside its domain.
    #[error("invalid {field} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        /// Option name.
        field: &'static str,
        /// Offending input.
        value: String,
        /// Accepted spellings.
        expected: &'static str,
    },

    /// Grid counts must be at least one cell.
    #[error("{field} must be >= 1, got {value}")]
    InvalidGrid {
        /// `grid_x` or `grid_y`.
        field: &'static str,
        /// Offending value.
        value: i64,
    },

    /// Division counts must be non-negative.
    #[error("{field} must be >= 0, got {value}")]
    NegativeDivisions {
        /// `divx` or `divy`.
        field: &'static str,
        /// Offending value.
        value: i64,
    },

    /// Tolerances must be non-negative.
    #[error("lid_fit_tolerance must be >= 0, got {0}")]
    NegativeTolerance(f64),

    /// NaN or infinite input.
    #[error("{0} must be a finite number")]
    NonFiniteValue(&'static str),

    /// The height leaves no room above the base and floor.
    #[error("height resolves to a {body:.2} mm body, which must exceed {minimum:.2} mm")]
    InvalidHeight {
        /// Resolved body height.
        body: f64,
        /// Smallest body that still has a cavity.
        minimum: f64,
    },

    /// `-D` named an option that does not exist.
    #[error("unknown option '{0}'")]
    UnknownKey(String),

    /// `-D` argument without `=`.
    #[error("malformed override '{0}' (expected key=value)")]
    MalformedOverride(String),

    /// Value could not be parsed as a number.
    #[error("invalid number for {field}: '{value}'")]
    InvalidNumber {
        /// Option name.
        field: String,
        /// Offending input.
        value: String,
    },

    /// Requested preset is not in the file.
    #[error("no preset named '{0}'")]
    UnknownPreset(String),

    /// Preset file failed to parse.
    #[error("preset file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
