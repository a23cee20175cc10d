//! Firmware protocol implementations
//!
//! Supported controllers:
//! - Marlin: the firmware of the drawing arm

pub mod marlin;

pub use marlin::{MarlinCommand, MarlinController, MarlinResponse, MarlinTiming};
