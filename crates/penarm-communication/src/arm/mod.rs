//! Arm state machine
//!
//! [`Arm`] owns the device link and the calibration record and enforces the
//! lifecycle `Disconnected -> Connected -> Calibrated`. The resting position
//! is tracked independently of calibration. Every change to the record is
//! written through the injected [`CalibrationStore`].

pub mod safe_motion;

pub use safe_motion::{MotionSink, SafeMotionExecutor, TRAVEL_FEEDRATE, Z_TOLERANCE};

use crate::communication::{find_arm_port, Communicator, ConnectionParams, DEFAULT_BAUD_RATE};
use crate::firmware::marlin::{
    MarlinController, MarlinTiming, MotionType, DEFAULT_FEED_FEEDRATE, DEFAULT_RAPID_FEEDRATE,
};
use penarm_core::{
    ArmState, CalibrationState, CalibrationStore, ConnectionError, ControllerError, CornerName,
    DrawingArea, DrawingEvent, Error, EventDispatcher, MotionCommand, Position, Result,
    StepCallback,
};
use std::time::Duration;

/// Height above the paper the test frame travels at
pub const TEST_FRAME_LIFT: f64 = 20.0;

/// Feedrate of the test frame's drawing moves (mm/min)
pub const TEST_FRAME_FEEDRATE: f64 = DEFAULT_FEED_FEEDRATE;

/// Link and timing settings of an [`Arm`]
#[derive(Debug, Clone, PartialEq)]
pub struct ArmConfig {
    /// Serial baud rate
    pub baud_rate: u32,
    /// Wait after opening the port before the first command
    pub startup_delay: Duration,
    /// Longest a homing cycle may take
    pub homing_timeout: Duration,
    /// Protocol waits
    pub timing: MarlinTiming,
    /// Pause between the legs of a split safe move
    pub leg_pause: Duration,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            startup_delay: Duration::from_secs(2),
            homing_timeout: Duration::from_secs(30),
            timing: MarlinTiming::default(),
            leg_pause: safe_motion::LEG_PAUSE,
        }
    }
}

impl ArmConfig {
    /// No startup delay or settle pauses, for simulated arms
    pub fn immediate() -> Self {
        Self {
            startup_delay: Duration::ZERO,
            timing: MarlinTiming::immediate(),
            leg_pause: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the homing timeout
    pub fn with_homing_timeout(mut self, timeout: Duration) -> Self {
        self.homing_timeout = timeout;
        self
    }
}

/// The drawing arm
pub struct Arm {
    controller: MarlinController,
    store: Box<dyn CalibrationStore>,
    calibration: CalibrationState,
    config: ArmConfig,
    events: EventDispatcher,
    port: Option<String>,
    motion: SafeMotionExecutor,
}

impl Arm {
    /// Create a disconnected arm, loading the calibration record from `store`
    pub fn new(
        communicator: Box<dyn Communicator>,
        mut store: Box<dyn CalibrationStore>,
        config: ArmConfig,
    ) -> Result<Self> {
        let calibration = store.load()?;
        let controller = MarlinController::new(communicator, config.timing);
        let motion = SafeMotionExecutor::new().with_leg_pause(config.leg_pause);
        Ok(Self {
            controller,
            store,
            calibration,
            config,
            events: EventDispatcher::default(),
            port: None,
            motion,
        })
    }

    /// Publish events through `events` instead of a private dispatcher
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Event dispatcher arm events are published on
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Settings in use
    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    /// Lifecycle state
    pub fn state(&self) -> ArmState {
        if !self.is_connected() {
            ArmState::Disconnected
        } else if self.calibration.is_calibrated() {
            ArmState::Calibrated
        } else {
            ArmState::Connected
        }
    }

    /// Whether the device link is open
    pub fn is_connected(&self) -> bool {
        self.port.is_some() && self.controller.is_connected()
    }

    /// Whether both corners are stored
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    /// Port of the open link
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// The calibration record
    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Drawing area spanned by the stored corners
    pub fn drawing_area(&self) -> Result<DrawingArea> {
        self.calibration.drawing_area()
    }

    /// Open the device link
    ///
    /// When already connected and `port` is `None` or the current port, the
    /// link is kept. Otherwise any open link is closed and the port is
    /// resolved from `port`, the stored port, then auto-detection. With
    /// `move_to_rest` the motors are locked and the arm goes to its saved
    /// resting position; failures of that step are only logged.
    ///
    /// Returns the port in use.
    pub fn connect(&mut self, port: Option<&str>, move_to_rest: bool) -> Result<String> {
        if let Some(current) = self.port.clone() {
            if self.controller.is_connected() && port.is_none_or(|p| p == current) {
                tracing::info!("Already connected to {}", current);
                if move_to_rest {
                    self.rest_after_connect();
                }
                return Ok(current);
            }
            tracing::info!("Disconnecting from {}", current);
            self.disconnect()?;
        }

        let port = self.resolve_port(port)?;
        tracing::info!("Connecting to arm on {}", port);

        let params = ConnectionParams::new(&port)
            .with_baud_rate(self.config.baud_rate)
            .with_startup_delay_ms(self.config.startup_delay.as_millis() as u64);
        self.controller.open(&params).map_err(|e| match e {
            link @ Error::Connection(_) => link,
            other => ConnectionError::FailedToOpen {
                port: port.clone(),
                reason: other.to_string(),
            }
            .into(),
        })?;

        self.port = Some(port.clone());
        self.motion.invalidate();
        self.calibration.port = Some(port.clone());
        self.persist()?;
        self.events.publish(DrawingEvent::Connected(port.clone()));
        tracing::info!("Connected to {}", port);

        if move_to_rest {
            self.rest_after_connect();
        }
        Ok(port)
    }

    fn resolve_port(&self, requested: Option<&str>) -> Result<String> {
        if let Some(port) = requested.or(self.calibration.port.as_deref()) {
            return Ok(port.to_string());
        }
        let ports = self.controller.available_ports().unwrap_or_else(|e| {
            tracing::warn!("Port detection failed: {}", e);
            Vec::new()
        });
        find_arm_port(&ports).ok_or_else(|| ConnectionError::NoPortFound.into())
    }

    fn rest_after_connect(&mut self) {
        if self.calibration.resting_position.is_none() {
            return;
        }
        tracing::info!("Moving to resting position");
        let result = self
            .lock_motors()
            .and_then(|_| self.go_to_resting_position());
        if let Err(e) = result {
            tracing::warn!("Could not move to resting position: {}", e);
        }
    }

    /// Close the device link; the calibration record is kept
    pub fn disconnect(&mut self) -> Result<()> {
        self.controller.close()?;
        self.motion.invalidate();
        if let Some(port) = self.port.take() {
            tracing::info!("Disconnected from {}", port);
            self.events.publish(DrawingEvent::Disconnected);
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ControllerError::NotConnected.into())
        }
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.calibration)
    }

    /// Run the homing cycle within the configured timeout
    pub fn home(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.motion.invalidate();
        self.controller.home(self.config.homing_timeout)?;
        self.events.publish(DrawingEvent::Homed);
        Ok(())
    }

    /// Current pose; `None` when the arm does not report one
    pub fn position(&mut self) -> Result<Option<Position>> {
        self.ensure_connected()?;
        Ok(self.controller.position())
    }

    /// Enable holding torque
    pub fn lock_motors(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.controller.lock_motors()
    }

    /// Release the motors so the arm can be positioned by hand
    pub fn unlock_motors(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.motion.invalidate();
        tracing::info!("Unlocking motors");
        self.controller.unlock_motors()
    }

    /// Direct jog of the given axes, without safe-move ordering
    pub fn move_to(
        &mut self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        feedrate: Option<f64>,
    ) -> Result<()> {
        self.ensure_connected()?;
        self.motion.invalidate();
        let feedrate = feedrate.unwrap_or(DEFAULT_FEED_FEEDRATE);
        self.controller
            .move_axes(MotionType::Rapid, x, y, z, Some(feedrate))
    }

    /// Z-ordered move to `target`, returning the new Z
    pub fn safe_move_to(&mut self, target: Position, feedrate: f64) -> Result<f64> {
        self.ensure_connected()?;
        self.motion
            .safe_move_to(&mut self.controller, target, feedrate)
    }

    /// Execute one generated motion command with a safe move
    pub fn execute(&mut self, command: &MotionCommand) -> Result<f64> {
        self.ensure_connected()?;
        self.motion.execute(&mut self.controller, command)
    }

    /// Store the live pose as a calibration corner
    pub fn save_corner(&mut self, name: CornerName) -> Result<Position> {
        self.ensure_connected()?;
        let position = self
            .controller
            .position()
            .ok_or(ControllerError::PositionUnavailable)?;

        self.calibration.set_corner(name, position);
        self.persist()?;
        self.events.publish(DrawingEvent::CornerSaved(name));
        tracing::info!("Saved {} at {}", name, position);
        if self.calibration.is_calibrated() {
            tracing::info!("Calibration complete");
        }
        Ok(position)
    }

    /// Forget both corners; the resting position is kept
    pub fn reset_calibration(&mut self) -> Result<()> {
        self.calibration.reset_corners();
        self.persist()?;
        self.events.publish(DrawingEvent::CalibrationReset);
        tracing::info!("Calibration reset");
        Ok(())
    }

    /// Store the live pose as the resting position
    pub fn save_resting_position(&mut self) -> Result<Position> {
        self.ensure_connected()?;
        let position = self
            .controller
            .position()
            .ok_or(ControllerError::PositionUnavailable)?;
        self.calibration.resting_position = Some(position);
        self.persist()?;
        tracing::info!("Saved resting position {}", position);
        Ok(position)
    }

    /// Saved resting position, or the default one
    pub fn resting_position(&self) -> Position {
        self.calibration.resting_or_default()
    }

    /// Safe move to the resting position
    pub fn go_to_resting_position(&mut self) -> Result<()> {
        let rest = self.resting_position();
        self.safe_move_to(rest, DEFAULT_RAPID_FEEDRATE)?;
        Ok(())
    }

    /// Draw the calibrated rectangle and both of its diagonals
    ///
    /// `on_step` is called after each completed move with a short status
    /// message; the same message is published as `StepCompleted`.
    pub fn draw_test_frame(&mut self, on_step: StepCallback<'_>) -> Result<()> {
        self.ensure_connected()?;
        let (Some(c1), Some(c2)) = (
            self.calibration.corners.corner1,
            self.calibration.corners.corner2,
        ) else {
            return Err(ControllerError::NotCalibrated.into());
        };
        let area = self.drawing_area()?;
        let z_draw = area.z_draw;
        let z_up = z_draw + TEST_FRAME_LIFT;

        let down = |x: f64, y: f64| Position::new(x, y, z_draw);
        let up = |x: f64, y: f64| Position::new(x, y, z_up);
        let c3 = (c2.x, c1.y);
        let c4 = (c1.x, c2.y);

        let steps = [
            (up(c1.x, c1.y), DEFAULT_RAPID_FEEDRATE, "Moved to corner 1"),
            (down(c1.x, c1.y), TEST_FRAME_FEEDRATE, "Pen down at corner 1"),
            (down(c3.0, c3.1), TEST_FRAME_FEEDRATE, "Drew edge to corner 3"),
            (down(c2.x, c2.y), TEST_FRAME_FEEDRATE, "Drew edge to corner 2"),
            (down(c4.0, c4.1), TEST_FRAME_FEEDRATE, "Drew edge to corner 4"),
            (down(c1.x, c1.y), TEST_FRAME_FEEDRATE, "Closed rectangle at corner 1"),
            (down(c2.x, c2.y), TEST_FRAME_FEEDRATE, "Drew diagonal from corner 1 to corner 2"),
            (up(c2.x, c2.y), TEST_FRAME_FEEDRATE, "Lifted pen at corner 2"),
            (up(c3.0, c3.1), DEFAULT_RAPID_FEEDRATE, "Moved to corner 3"),
            (down(c3.0, c3.1), TEST_FRAME_FEEDRATE, "Pen down at corner 3"),
            (down(c4.0, c4.1), TEST_FRAME_FEEDRATE, "Drew diagonal from corner 3 to corner 4"),
            (up(c4.0, c4.1), TEST_FRAME_FEEDRATE, "Lifted pen at corner 4"),
        ];

        let mut report = |arm: &Arm, message: &str| {
            tracing::debug!("Test frame: {}", message);
            on_step(message);
            arm.events
                .publish(DrawingEvent::StepCompleted(message.to_string()));
        };

        self.go_to_resting_position()?;
        report(self, "Moved to resting position");
        for (target, feedrate, message) in steps {
            self.safe_move_to(target, feedrate)?;
            report(self, message);
        }
        self.go_to_resting_position()?;
        report(self, "Returned to resting position");

        tracing::info!("Test frame complete");
        Ok(())
    }
}

impl std::fmt::Debug for Arm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arm")
            .field("state", &self.state())
            .field("port", &self.port)
            .field("calibration", &self.calibration)
            .finish()
    }
}
