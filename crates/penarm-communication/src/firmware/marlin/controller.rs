//! Marlin Controller Implementation
//!
//! Line-oriented request/acknowledge driver for the arm. Every command is one
//! newline-terminated line; most are answered by a line equal to `ok`, which
//! [`MarlinController::send`] waits for. Replies are framed from the raw
//! bytes the [`Communicator`] hands back.

use super::command_creator::{MarlinCommand, MotionType};
use super::response_parser::{self, MarlinResponse};
use crate::communication::{Communicator, ConnectionParams, SerialPortInfo};
use penarm_core::{ControllerError, Error, Position, Result};
use std::time::{Duration, Instant};

/// Waits the controller inserts around slow firmware operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarlinTiming {
    /// How long to wait for `ok` after an ordinary command
    pub ack_timeout: Duration,
    /// How long to wait for a complete `M114` reply
    pub position_timeout: Duration,
    /// Pause between sending `M114` and reading the reply
    pub position_settle: Duration,
    /// Pause after a completed homing cycle before reading the pose
    pub homing_settle: Duration,
    /// Pause after `M17`
    pub lock_settle: Duration,
    /// Pause after `M84`
    pub unlock_settle: Duration,
    /// Sleep between empty reads
    pub poll_interval: Duration,
}

impl Default for MarlinTiming {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(10),
            position_timeout: Duration::from_secs(1),
            position_settle: Duration::from_millis(300),
            homing_settle: Duration::from_secs(2),
            lock_settle: Duration::from_millis(200),
            unlock_settle: Duration::from_millis(300),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl MarlinTiming {
    /// No settle pauses; for simulated arms that answer instantly
    pub fn immediate() -> Self {
        Self {
            position_settle: Duration::ZERO,
            homing_settle: Duration::ZERO,
            lock_settle: Duration::ZERO,
            unlock_settle: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            ..Self::default()
        }
    }

    /// Set the acknowledgement timeout
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }
}

/// Marlin protocol driver over a [`Communicator`]
pub struct MarlinController {
    communicator: Box<dyn Communicator>,
    timing: MarlinTiming,
    pending: String,
}

impl MarlinController {
    /// Create a controller; the link is opened by [`open`](Self::open)
    pub fn new(communicator: Box<dyn Communicator>, timing: MarlinTiming) -> Self {
        Self {
            communicator,
            timing,
            pending: String::new(),
        }
    }

    /// Timing in use
    pub fn timing(&self) -> &MarlinTiming {
        &self.timing
    }

    /// Ports the underlying link can be opened on
    pub fn available_ports(&self) -> Result<Vec<SerialPortInfo>> {
        self.communicator.available_ports()
    }

    /// Open the link and switch the arm to absolute positioning
    pub fn open(&mut self, params: &ConnectionParams) -> Result<()> {
        self.pending.clear();
        self.communicator.connect(params)?;
        if let Err(e) = self.send(&MarlinCommand::AbsoluteMode) {
            let _ = self.communicator.disconnect();
            return Err(e);
        }
        Ok(())
    }

    /// Close the link
    pub fn close(&mut self) -> Result<()> {
        self.pending.clear();
        self.communicator.disconnect()
    }

    /// Whether the link is open
    pub fn is_connected(&self) -> bool {
        self.communicator.is_connected()
    }

    /// Send a command, waiting for `ok` when the firmware sends one
    pub fn send(&mut self, command: &MarlinCommand) -> Result<Vec<String>> {
        let line = command.to_string();
        if command.expects_ok() {
            self.send_command(&line, self.timing.ack_timeout)
        } else {
            self.send_no_wait(&line).map(|_| Vec::new())
        }
    }

    /// Write `line` and collect reply lines until `ok`
    ///
    /// Returns the replies before the `ok`. Error replies are logged and do
    /// not end the wait.
    pub fn send_command(&mut self, line: &str, timeout: Duration) -> Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }
        self.write_line(line)?;

        let deadline = Instant::now() + timeout;
        let mut replies = Vec::new();
        while let Some(reply) = self.read_line(deadline)? {
            match response_parser::parse_response(&reply) {
                Some(MarlinResponse::Ok) => return Ok(replies),
                Some(MarlinResponse::Error(msg)) => {
                    tracing::warn!("Arm reported an error for '{}': {}", line, msg);
                }
                Some(MarlinResponse::Busy(msg)) => tracing::trace!("Arm busy: {}", msg),
                Some(_) => tracing::debug!("<< {}", reply),
                None => continue,
            }
            replies.push(reply);
        }

        Err(ControllerError::Timeout {
            command: line.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
        .into())
    }

    /// Write `line` without waiting for a reply
    pub fn send_no_wait(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        self.write_line(line)
    }

    /// Run the homing cycle, failing with `HomingTimeout` if it is not
    /// acknowledged within `timeout`
    pub fn home(&mut self, timeout: Duration) -> Result<()> {
        tracing::info!("Starting homing sequence");
        match self.send_command(&MarlinCommand::Home.to_string(), timeout) {
            Ok(_) => {}
            Err(Error::Controller(ControllerError::Timeout { .. })) => {
                return Err(ControllerError::HomingTimeout {
                    timeout_secs: timeout.as_secs(),
                }
                .into());
            }
            Err(e) => return Err(e),
        }

        pause(self.timing.homing_settle);
        match self.position() {
            Some(p) => tracing::info!("Homing complete at {}", p),
            None => tracing::warn!("Homing complete but the position could not be verified"),
        }
        Ok(())
    }

    /// Read the pose with `M114`
    ///
    /// Any failure yields `None`; the link stays open.
    pub fn position(&mut self) -> Option<Position> {
        match self.query_position() {
            Ok(Some(p)) => Some(p),
            Ok(None) => {
                tracing::warn!("Position report did not contain X, Y and Z");
                None
            }
            Err(e) => {
                tracing::warn!("Error getting position: {}", e);
                None
            }
        }
    }

    fn query_position(&mut self) -> Result<Option<Position>> {
        self.ensure_connected()?;
        self.pending.clear();
        self.communicator.clear_input()?;
        self.write_line(&MarlinCommand::ReportPosition.to_string())?;
        pause(self.timing.position_settle);

        let deadline = Instant::now() + self.timing.position_timeout;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line(deadline)? {
            if line == "ok" {
                break;
            }
            lines.push(line);
        }
        Ok(response_parser::find_position(lines.iter().map(String::as_str)))
    }

    /// Enable holding torque
    pub fn lock_motors(&mut self) -> Result<()> {
        self.send(&MarlinCommand::LockMotors)?;
        pause(self.timing.lock_settle);
        Ok(())
    }

    /// Release the motors so the arm can be positioned by hand
    pub fn unlock_motors(&mut self) -> Result<()> {
        self.send(&MarlinCommand::UnlockMotors)?;
        pause(self.timing.unlock_settle);
        Ok(())
    }

    /// Move the given axes; a missing feedrate uses the motion type's default
    pub fn move_axes(
        &mut self,
        motion: MotionType,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        feedrate: Option<f64>,
    ) -> Result<()> {
        self.send(&MarlinCommand::Move {
            motion,
            x,
            y,
            z,
            feedrate: feedrate.unwrap_or_else(|| motion.default_feedrate()),
        })
        .map(|_| ())
    }

    /// Linear move to an absolute position
    pub fn move_linear(&mut self, target: Position, feedrate: f64) -> Result<()> {
        self.send(&MarlinCommand::linear(target.x, target.y, target.z, feedrate))
            .map(|_| ())
    }

    /// Rapid move to an absolute position
    pub fn move_rapid(&mut self, target: Position, feedrate: f64) -> Result<()> {
        self.send(&MarlinCommand::rapid(target.x, target.y, target.z, feedrate))
            .map(|_| ())
    }

    /// Pause on the firmware side
    pub fn dwell(&mut self, millis: u64) -> Result<()> {
        self.send(&MarlinCommand::Dwell { millis }).map(|_| ())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.communicator.is_connected() {
            Ok(())
        } else {
            Err(ControllerError::NotConnected.into())
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.ensure_connected()?;
        tracing::debug!(">> {}", line);
        let framed = format!("{}\n", line);
        self.communicator.send(framed.as_bytes())?;
        Ok(())
    }

    /// Next non-empty reply line, or `None` once `deadline` passes
    fn read_line(&mut self, deadline: Instant) -> Result<Option<String>> {
        loop {
            if let Some(end) = self.pending.find('\n') {
                let raw: String = self.pending.drain(..=end).collect();
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                return Ok(Some(line.to_string()));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            let bytes = self.communicator.receive()?;
            if bytes.is_empty() {
                std::thread::sleep(self.timing.poll_interval);
            } else {
                self.pending.push_str(&String::from_utf8_lossy(&bytes));
            }
        }
    }
}

impl std::fmt::Debug for MarlinController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarlinController")
            .field("connected", &self.is_connected())
            .field("timing", &self.timing)
            .finish()
    }
}

pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
