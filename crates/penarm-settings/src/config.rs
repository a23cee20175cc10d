//! Configuration and settings management for PenArm
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in the platform config directory.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (port, baud rate, timeouts)
//! - Drawing settings (pen lift, feedrates, command budget, extraction preset)

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Port value meaning "detect the arm automatically"
pub const AUTO_PORT: &str = "Auto";

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port, or `Auto` to detect
    pub port: String,
    /// Baud rate for the serial link
    pub baud_rate: u32,
    /// How long to wait for each `ok`, in milliseconds
    pub timeout_ms: u64,
    /// How long homing may take, in seconds
    pub homing_timeout_secs: u64,
    /// Pause after opening the port while the firmware boots, in milliseconds
    pub startup_delay_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            baud_rate: 115200,
            timeout_ms: 10_000,
            homing_timeout_secs: 30,
            startup_delay_ms: 2000,
        }
    }
}

impl ConnectionSettings {
    /// The configured port, or `None` when it should be detected
    pub fn explicit_port(&self) -> Option<&str> {
        let port = self.port.trim();
        if port.is_empty() || port.eq_ignore_ascii_case(AUTO_PORT) {
            None
        } else {
            Some(port)
        }
    }
}

/// Drawing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingSettings {
    /// How far above the drawing height the pen travels, in mm
    pub pen_lift_height: f64,
    /// Feedrate while drawing, in mm/min
    pub feedrate_draw: f64,
    /// Feedrate while travelling, in mm/min
    pub feedrate_move: f64,
    /// Maximum number of motion commands per drawing
    pub max_commands: usize,
    /// Name of the stroke extraction preset
    pub preset: String,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            pen_lift_height: 16.0,
            feedrate_draw: 8000.0,
            feedrate_move: 8000.0,
            max_commands: 5000,
            preset: "clean_v1".to_string(),
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the calibration record lives; defaults to the config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_file: Option<PathBuf>,
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Drawing settings
    pub drawing: DrawingSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform directory holding PenArm files
    pub fn config_dir() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("penarm"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Default location of the config file
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Where the calibration record is stored
    pub fn calibration_path(&self) -> SettingsResult<PathBuf> {
        match &self.calibration_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("calibration.json")),
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match Format::from_path(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load config from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.connection.timeout_ms == 0 {
            return Err(SettingsError::invalid("connection.timeout_ms", "must be > 0"));
        }

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }

        if self.connection.homing_timeout_secs == 0 {
            return Err(SettingsError::invalid(
                "connection.homing_timeout_secs",
                "must be > 0",
            ));
        }

        if !is_positive(self.drawing.pen_lift_height) {
            return Err(SettingsError::invalid(
                "drawing.pen_lift_height",
                "must be > 0",
            ));
        }

        if !is_positive(self.drawing.feedrate_draw) || !is_positive(self.drawing.feedrate_move) {
            return Err(SettingsError::invalid("drawing.feedrate", "must be > 0"));
        }

        if self.drawing.max_commands == 0 {
            return Err(SettingsError::invalid("drawing.max_commands", "must be > 0"));
        }

        if self.drawing.preset.trim().is_empty() {
            return Err(SettingsError::invalid("drawing.preset", "must not be empty"));
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
