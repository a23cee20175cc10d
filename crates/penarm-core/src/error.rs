//! Error handling for PenArm
//!
//! Provides error types for all layers of the application:
//! - Controller errors (arm state, calibration and motion preconditions)
//! - Connection errors (serial link)
//! - Image errors (raster input)
//!
//! All error types use `thiserror`. [`ErrorKind`] flattens them into the
//! small taxonomy callers branch on.

use thiserror::Error;

/// Controller error type
///
/// Represents errors raised while driving the arm: precondition violations,
/// homing failures and unusable device replies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// Arm is not connected
    #[error("Arm not connected")]
    NotConnected,

    /// Both calibration corners are required
    #[error("Arm not calibrated: both corners must be saved first")]
    NotCalibrated,

    /// Homing did not finish in time
    #[error("Homing timed out after {timeout_secs} seconds. The arm may be stuck or unpowered.")]
    HomingTimeout {
        /// The homing timeout in seconds.
        timeout_secs: u64,
    },

    /// The arm did not report a usable position
    #[error("Could not read the arm position")]
    PositionUnavailable,

    /// A command was not acknowledged in time
    #[error("Command '{command}' not acknowledged after {timeout_ms}ms")]
    Timeout {
        /// The command that timed out.
        command: String,
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Command was rejected by the firmware
    #[error("Command rejected: {reason}")]
    CommandRejected {
        /// The reason the command was rejected.
        reason: String,
    },

    /// Taught corners do not span a rectangle
    #[error("Invalid drawing area: {reason}")]
    InvalidDrawingArea {
        /// Why the corners cannot be used.
        reason: String,
    },

    /// Another drawing session holds the arm
    #[error("Arm is busy with another drawing session")]
    Busy,
}

/// Connection error type
///
/// Represents errors related to the serial link with the arm.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// No port given and none could be detected
    #[error("No serial port found. Is the arm plugged in?")]
    NoPortFound,

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Connection lost
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Port enumeration failed
    #[error("Failed to enumerate ports: {reason}")]
    Enumeration {
        /// The reason enumeration failed.
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {reason}")]
    IoError {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Raster input error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// The file could not be decoded
    #[error("Unreadable image: {reason}")]
    Unreadable {
        /// Decoder message.
        reason: String,
    },

    /// The image has zero width or height
    #[error("Image has no pixels")]
    Empty,
}

/// Coarse error classification
///
/// Lets callers branch on the failure class without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unreadable or corrupt raster
    InvalidImage,
    /// No serial port could be resolved
    NoPortFound,
    /// The device link could not be opened or was lost
    ConnectFailed,
    /// Homing did not complete in time
    HomingTimeout,
    /// Motion attempted without a connection
    NotConnected,
    /// Calibration-dependent call without both corners
    NotCalibrated,
    /// Transient position read failure
    PositionUnavailable,
    /// Anything else
    Other,
}

/// Main error type for PenArm
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Image error
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Image(_) => ErrorKind::InvalidImage,
            Error::Connection(ConnectionError::NoPortFound) => ErrorKind::NoPortFound,
            Error::Connection(_) => ErrorKind::ConnectFailed,
            Error::Controller(ControllerError::HomingTimeout { .. }) => ErrorKind::HomingTimeout,
            Error::Controller(ControllerError::NotConnected) => ErrorKind::NotConnected,
            Error::Controller(ControllerError::NotCalibrated) => ErrorKind::NotCalibrated,
            Error::Controller(ControllerError::PositionUnavailable) => {
                ErrorKind::PositionUnavailable
            }
            _ => ErrorKind::Other,
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Controller(ControllerError::Timeout { .. })
                | Error::Controller(ControllerError::HomingTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
