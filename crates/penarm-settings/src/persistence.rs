//! Calibration persistence
//!
//! Stores the per-device calibration record as a small pretty-printed JSON
//! document next to the config file. A missing file is an empty record.

use crate::error::{SettingsError, SettingsResult};
use penarm_core::{CalibrationState, CalibrationStore};
use std::path::{Path, PathBuf};

/// JSON-backed calibration record
#[derive(Debug, Clone)]
pub struct CalibrationFile {
    path: PathBuf,
}

impl CalibrationFile {
    /// Use the record at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record; a missing file yields an empty record
    pub fn read(&self) -> SettingsResult<CalibrationState> {
        if !self.path.exists() {
            tracing::debug!("No calibration at {}", self.path.display());
            return Ok(CalibrationState::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(CalibrationState::default());
        }

        serde_json::from_str(&content).map_err(|e| SettingsError::Corrupted {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the record, creating parent directories as needed
    pub fn write(&self, state: &CalibrationState) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!("Saved calibration to {}", self.path.display());
        Ok(())
    }
}

impl CalibrationStore for CalibrationFile {
    fn load(&mut self) -> penarm_core::Result<CalibrationState> {
        Ok(self.read()?)
    }

    fn save(&mut self, state: &CalibrationState) -> penarm_core::Result<()> {
        Ok(self.write(state)?)
    }
}
