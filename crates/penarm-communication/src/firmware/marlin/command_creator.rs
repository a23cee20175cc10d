//! Marlin Command Creator
//!
//! Builds the G-code/M-code lines the arm's Marlin firmware understands.

use penarm_core::{MotionCommand, MotionKind};
use std::fmt;

/// Default feedrate of a rapid move (mm/min)
pub const DEFAULT_RAPID_FEEDRATE: f64 = 3000.0;

/// Default feedrate of a feed move (mm/min)
pub const DEFAULT_FEED_FEEDRATE: f64 = 2000.0;

/// Motion types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionType {
    /// Rapid movement (G0)
    Rapid,
    /// Linear interpolated movement (G1)
    Linear,
}

impl MotionType {
    fn word(self) -> &'static str {
        match self {
            Self::Rapid => "G0",
            Self::Linear => "G1",
        }
    }

    /// Feedrate used when the caller gives none
    pub fn default_feedrate(self) -> f64 {
        match self {
            Self::Rapid => DEFAULT_RAPID_FEEDRATE,
            Self::Linear => DEFAULT_FEED_FEEDRATE,
        }
    }
}

/// One command line for the arm
#[derive(Debug, Clone, PartialEq)]
pub enum MarlinCommand {
    /// Absolute positioning (G90)
    AbsoluteMode,
    /// Relative positioning (G91)
    RelativeMode,
    /// Homing cycle (G28)
    Home,
    /// Move to the given axes; omitted axes keep their value
    Move {
        /// Rapid or linear
        motion: MotionType,
        /// Target X
        x: Option<f64>,
        /// Target Y
        y: Option<f64>,
        /// Target Z
        z: Option<f64>,
        /// Feedrate in mm/min
        feedrate: f64,
    },
    /// Pause (G4 P<ms>)
    Dwell {
        /// Pause in milliseconds
        millis: u64,
    },
    /// Enable holding torque (M17)
    LockMotors,
    /// Release the motors for hand positioning (M84)
    UnlockMotors,
    /// Report the current position (M114)
    ReportPosition,
}

impl MarlinCommand {
    /// Linear move to all three axes
    pub fn linear(x: f64, y: f64, z: f64, feedrate: f64) -> Self {
        Self::Move {
            motion: MotionType::Linear,
            x: Some(x),
            y: Some(y),
            z: Some(z),
            feedrate,
        }
    }

    /// Rapid move to all three axes
    pub fn rapid(x: f64, y: f64, z: f64, feedrate: f64) -> Self {
        Self::Move {
            motion: MotionType::Rapid,
            x: Some(x),
            y: Some(y),
            z: Some(z),
            feedrate,
        }
    }

    /// Whether the firmware answers this command with `ok`
    ///
    /// Motor lock/unlock are not guaranteed to be acknowledged.
    pub fn expects_ok(&self) -> bool {
        !matches!(self, Self::LockMotors | Self::UnlockMotors)
    }
}

impl From<&MotionCommand> for MarlinCommand {
    fn from(command: &MotionCommand) -> Self {
        let motion = match command.kind {
            MotionKind::Move => MotionType::Rapid,
            MotionKind::Draw => MotionType::Linear,
        };
        Self::Move {
            motion,
            x: Some(command.x),
            y: Some(command.y),
            z: Some(command.z),
            feedrate: command.feedrate,
        }
    }
}

impl fmt::Display for MarlinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsoluteMode => write!(f, "G90"),
            Self::RelativeMode => write!(f, "G91"),
            Self::Home => write!(f, "G28"),
            Self::Move {
                motion,
                x,
                y,
                z,
                feedrate,
            } => {
                write!(f, "{}", motion.word())?;
                for (axis, value) in [('X', x), ('Y', y), ('Z', z)] {
                    if let Some(v) = value {
                        write!(f, " {}{:.3}", axis, v)?;
                    }
                }
                write!(f, " F{:.0}", feedrate)
            }
            Self::Dwell { millis } => write!(f, "G4 P{}", millis),
            Self::LockMotors => write!(f, "M17"),
            Self::UnlockMotors => write!(f, "M84"),
            Self::ReportPosition => write!(f, "M114"),
        }
    }
}
