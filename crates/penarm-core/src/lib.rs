//! # PenArm Core
//!
//! Core types and shared state for PenArm.
//! Provides the data model (points, positions, motion commands, calibration),
//! the error taxonomy, drawing events and the shared progress counter.

pub mod calibration;
pub mod core;
pub mod data;
pub mod error;
pub mod types;

pub use calibration::{CalibrationStore, MemoryCalibrationStore};

pub use core::{
    event::{DrawingEvent, EventDispatcher},
    progress::{Progress, ProgressCounter},
};

pub use data::{
    ArmState, CalibrationState, CornerName, Corners, DrawingArea, MotionCommand, MotionKind,
    Point, Position, DEFAULT_RESTING_POSITION,
};

pub use error::{ConnectionError, ControllerError, Error, ErrorKind, ImageError, Result};

pub use types::{thread_safe, StepCallback, ThreadSafe};
