//! Safe Motion Executor
//!
//! Replays motion commands so the pen never travels sideways while touching
//! the paper. Each target is reached in at most two moves:
//!
//! - Z change under [`Z_TOLERANCE`]: one direct move at the commanded feedrate.
//! - Lifting: raise Z in place, then travel XY at the new height.
//! - Lowering: travel XY at the current height, then lower at the commanded
//!   feedrate.
//!
//! Lift and travel moves use the fast travel feedrate.

use crate::firmware::marlin::{pause, MarlinController};
use penarm_core::{MotionCommand, Position, Result};
use std::time::Duration;

/// Z changes smaller than this are made together with the XY move
pub const Z_TOLERANCE: f64 = 0.5;

/// Feedrate of the lift and lateral travel legs (mm/min)
pub const TRAVEL_FEEDRATE: f64 = 10_000.0;

/// Pause between the two legs of a split move
pub const LEG_PAUSE: Duration = Duration::from_millis(50);

/// Something that executes single absolute moves
pub trait MotionSink {
    /// Move to `target` at `feedrate`
    fn move_to(&mut self, target: Position, feedrate: f64) -> Result<()>;

    /// Current pose, if it can be read
    fn current_position(&mut self) -> Option<Position>;

    /// Wait between the legs of a split move
    fn settle(&mut self, _duration: Duration) {}
}

impl MotionSink for MarlinController {
    fn move_to(&mut self, target: Position, feedrate: f64) -> Result<()> {
        self.move_rapid(target, feedrate)
    }

    fn current_position(&mut self) -> Option<Position> {
        self.position()
    }

    fn settle(&mut self, duration: Duration) {
        pause(duration);
    }
}

/// Z-aware move sequencer
///
/// Holds the pose left by the previous move, so a session creates one
/// executor and feeds it every command in order.
#[derive(Debug, Clone)]
pub struct SafeMotionExecutor {
    current: Option<Position>,
    travel_feedrate: f64,
    leg_pause: Duration,
}

impl Default for SafeMotionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeMotionExecutor {
    /// Executor with an unknown starting pose
    pub fn new() -> Self {
        Self {
            current: None,
            travel_feedrate: TRAVEL_FEEDRATE,
            leg_pause: LEG_PAUSE,
        }
    }

    /// Start from a known pose instead of reading it from the arm
    pub fn with_position(mut self, position: Position) -> Self {
        self.current = Some(position);
        self
    }

    /// Set the lift/travel feedrate
    pub fn with_travel_feedrate(mut self, feedrate: f64) -> Self {
        self.travel_feedrate = feedrate;
        self
    }

    /// Set the pause between the legs of a split move
    pub fn with_leg_pause(mut self, pause: Duration) -> Self {
        self.leg_pause = pause;
        self
    }

    /// Pose after the last move, if known
    pub fn position(&self) -> Option<Position> {
        self.current
    }

    /// Height after the last move, if known
    pub fn current_z(&self) -> Option<f64> {
        self.current.map(|p| p.z)
    }

    /// Forget the tracked pose, e.g. after the arm was moved by other means
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// Move to `target`, returning the new Z
    ///
    /// When the starting pose is unknown it is read from the sink; if that
    /// fails the move is made directly.
    pub fn safe_move_to(
        &mut self,
        sink: &mut dyn MotionSink,
        target: Position,
        feedrate: f64,
    ) -> Result<f64> {
        let current = match self.current.or_else(|| sink.current_position()) {
            Some(p) => p,
            None => {
                tracing::debug!("Position unknown, moving directly to {}", target);
                sink.move_to(target, feedrate)?;
                self.current = Some(target);
                return Ok(target.z);
            }
        };
        // the pose is unknown until the moves below succeed
        self.current = None;

        let dz = target.z - current.z;
        if dz.abs() < Z_TOLERANCE {
            sink.move_to(target, feedrate)?;
        } else if dz > 0.0 {
            sink.move_to(Position::new(current.x, current.y, target.z), self.travel_feedrate)?;
            self.current = Some(Position::new(current.x, current.y, target.z));
            sink.settle(self.leg_pause);
            sink.move_to(target, self.travel_feedrate)?;
        } else {
            sink.move_to(Position::new(target.x, target.y, current.z), self.travel_feedrate)?;
            self.current = Some(Position::new(target.x, target.y, current.z));
            sink.settle(self.leg_pause);
            sink.move_to(target, feedrate)?;
        }

        self.current = Some(target);
        Ok(target.z)
    }

    /// Execute one generated motion command
    pub fn execute(&mut self, sink: &mut dyn MotionSink, command: &MotionCommand) -> Result<f64> {
        self.safe_move_to(sink, command.target(), command.feedrate)
    }
}
