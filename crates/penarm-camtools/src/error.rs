//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for raster input and
//! pipeline parameter validation.

use thiserror::Error;

/// Errors that can occur while turning an image into motion commands.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The raster could not be decoded or has no pixels.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// No extraction preset has this name.
    #[error("Unknown extraction preset: {0}")]
    UnknownPreset(String),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to pipeline parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

impl From<CamToolError> for penarm_core::Error {
    fn from(err: CamToolError) -> Self {
        match err {
            CamToolError::InvalidImage(reason) => {
                penarm_core::ImageError::Unreadable { reason }.into()
            }
            other => penarm_core::Error::other(other.to_string()),
        }
    }
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
