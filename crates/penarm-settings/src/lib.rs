//! PenArm Settings Crate
//!
//! Handles application configuration and the persisted calibration record.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{Config, ConnectionSettings, DrawingSettings, AUTO_PORT};
pub use error::{SettingsError, SettingsResult};
pub use persistence::CalibrationFile;
