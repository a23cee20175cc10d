//! Calibration persistence seam
//!
//! The arm never reads or writes calibration files itself; it is handed a
//! [`CalibrationStore`] and calls it whenever the record changes.

use crate::data::CalibrationState;
use crate::error::Result;

/// Loads and saves the per-device calibration record
pub trait CalibrationStore: Send {
    /// Load the stored record, or an empty one if nothing was saved yet
    fn load(&mut self) -> Result<CalibrationState>;

    /// Persist the record
    fn save(&mut self, state: &CalibrationState) -> Result<()>;
}

/// In-memory store used by tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStore {
    state: CalibrationState,
    saves: usize,
}

impl MemoryCalibrationStore {
    /// Create a store pre-seeded with a record
    pub fn new(state: CalibrationState) -> Self {
        Self { state, saves: 0 }
    }

    /// Last saved record
    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&mut self) -> Result<CalibrationState> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &CalibrationState) -> Result<()> {
        self.state = state.clone();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CornerName, Position};

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryCalibrationStore::default();
        let mut state = store.load().unwrap();
        assert!(!state.is_calibrated());

        state.set_corner(CornerName::Corner1, Position::new(1.0, 2.0, 3.0));
        store.save(&state).unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap(), state);
    }
}
