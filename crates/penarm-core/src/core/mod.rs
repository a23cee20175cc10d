//! Runtime building blocks shared by the arm and the drawing session
//!
//! - [`event`]: drawing events and a broadcast dispatcher
//! - [`progress`]: the shared progress counter read by observers

pub mod event;
pub mod progress;
