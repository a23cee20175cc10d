//! Simulated arm
//!
//! Speaks the same line protocol as the firmware: every complete line is
//! logged, most commands are answered with `ok`, moves update the simulated
//! pose and `M114` reports it. Motor lock/unlock get no reply, as on the real
//! device. A [`VirtualArmHandle`] inspects and scripts the simulation after
//! the arm has been boxed into a controller.

use super::{Communicator, ConnectionParams, SerialPortInfo};
use penarm_core::{thread_safe, ConnectionError, Position, Result, ThreadSafe};
use std::collections::VecDeque;

/// Port name the virtual arm advertises
pub const VIRTUAL_PORT: &str = "virtual";

/// Pose after a homing cycle
pub const VIRTUAL_HOME: Position = Position {
    x: 0.0,
    y: 300.0,
    z: 0.0,
};

#[derive(Debug)]
struct SimState {
    position: Position,
    absolute: bool,
    motors_locked: bool,
    homed: bool,
    received: Vec<String>,
    output: VecDeque<u8>,
    hang_on_home: bool,
    report_position: bool,
    refuse_connect: bool,
    ports: Vec<SerialPortInfo>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            position: VIRTUAL_HOME,
            absolute: true,
            motors_locked: false,
            homed: false,
            received: Vec::new(),
            output: VecDeque::new(),
            hang_on_home: false,
            report_position: true,
            refuse_connect: false,
            ports: vec![SerialPortInfo::new(VIRTUAL_PORT, "Virtual USB Serial")],
        }
    }
}

impl SimState {
    fn reply(&mut self, line: &str) {
        self.output.extend(line.bytes());
        self.output.push_back(b'\n');
    }

    fn execute(&mut self, line: &str) {
        self.received.push(line.to_string());
        let mut words = line.split_whitespace();
        let Some(code) = words.next() else {
            return;
        };

        match code.to_ascii_uppercase().as_str() {
            "G0" | "G1" => {
                let mut target = if self.absolute {
                    self.position
                } else {
                    Position::default()
                };
                for word in words {
                    let mut chars = word.chars();
                    let axis = chars.next().map(|c| c.to_ascii_uppercase());
                    let Ok(value) = chars.as_str().parse::<f64>() else {
                        continue;
                    };
                    match axis {
                        Some('X') => target.x = value,
                        Some('Y') => target.y = value,
                        Some('Z') => target.z = value,
                        _ => {}
                    }
                }
                if !self.absolute {
                    target = Position::new(
                        self.position.x + target.x,
                        self.position.y + target.y,
                        self.position.z + target.z,
                    );
                }
                self.position = target;
                self.reply("ok");
            }
            "G28" => {
                if self.hang_on_home {
                    return;
                }
                self.position = VIRTUAL_HOME;
                self.homed = true;
                self.reply("ok");
            }
            "G90" => {
                self.absolute = true;
                self.reply("ok");
            }
            "G91" => {
                self.absolute = false;
                self.reply("ok");
            }
            "G4" => self.reply("ok"),
            "M17" => self.motors_locked = true,
            "M84" => self.motors_locked = false,
            "M114" => {
                if self.report_position {
                    let p = self.position;
                    let report = format!(
                        "X:{:.2} Y:{:.2} Z:{:.2} E:0.00 Count X:0 Y:0 Z:0",
                        p.x, p.y, p.z
                    );
                    self.reply(&report);
                } else {
                    self.reply("echo:busy: processing");
                }
                self.reply("ok");
            }
            other => {
                let echo = format!("echo:Unknown command: \"{}\"", other);
                self.reply(&echo);
                self.reply("ok");
            }
        }
    }
}

/// In-process simulated arm
#[derive(Debug)]
pub struct VirtualArm {
    state: ThreadSafe<SimState>,
    params: Option<ConnectionParams>,
    partial: String,
}

impl VirtualArm {
    /// Create a disconnected simulated arm resting at its home pose
    pub fn new() -> Self {
        Self {
            state: thread_safe(SimState::default()),
            params: None,
            partial: String::new(),
        }
    }

    /// Handle sharing this arm's simulation state
    pub fn handle(&self) -> VirtualArmHandle {
        VirtualArmHandle {
            state: self.state.clone(),
        }
    }
}

impl Default for VirtualArm {
    fn default() -> Self {
        Self::new()
    }
}

impl Communicator for VirtualArm {
    fn connect(&mut self, params: &ConnectionParams) -> Result<()> {
        let mut state = self.state.lock();
        if state.refuse_connect {
            return Err(ConnectionError::FailedToOpen {
                port: params.port.clone(),
                reason: "device refused the connection".to_string(),
            }
            .into());
        }
        state.output.clear();
        state.reply("start");
        state.reply("echo: virtual arm ready");
        drop(state);

        self.params = Some(params.clone());
        self.partial.clear();
        self.clear_input()
    }

    fn disconnect(&mut self) -> Result<()> {
        self.params = None;
        self.partial.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.params.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        if self.params.is_none() {
            return Err(ConnectionError::ConnectionLost {
                reason: "virtual arm is not connected".to_string(),
            }
            .into());
        }

        self.partial.push_str(&String::from_utf8_lossy(data));
        let mut state = self.state.lock();
        while let Some(end) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=end).collect();
            let line = line.trim();
            if !line.is_empty() {
                state.execute(line);
            }
        }
        Ok(data.len())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        if self.params.is_none() {
            return Ok(Vec::new());
        }
        Ok(self.state.lock().output.drain(..).collect())
    }

    fn available_ports(&self) -> Result<Vec<SerialPortInfo>> {
        Ok(self.state.lock().ports.clone())
    }

    fn connection_params(&self) -> Option<&ConnectionParams> {
        self.params.as_ref()
    }
}

/// Inspects and scripts a [`VirtualArm`]
#[derive(Debug, Clone)]
pub struct VirtualArmHandle {
    state: ThreadSafe<SimState>,
}

impl VirtualArmHandle {
    /// Every line the arm received, in order
    pub fn received(&self) -> Vec<String> {
        self.state.lock().received.clone()
    }

    /// Received `G0`/`G1` lines only
    pub fn moves(&self) -> Vec<String> {
        self.state
            .lock()
            .received
            .iter()
            .filter(|line| line.starts_with("G0 ") || line.starts_with("G1 "))
            .cloned()
            .collect()
    }

    /// Forget the received lines
    pub fn clear_received(&self) {
        self.state.lock().received.clear();
    }

    /// Simulated pose
    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    /// Move the simulated arm, as if positioned by hand
    pub fn set_position(&self, position: Position) {
        self.state.lock().position = position;
    }

    /// Whether the last motor command was a lock
    pub fn motors_locked(&self) -> bool {
        self.state.lock().motors_locked
    }

    /// Whether a homing cycle completed
    pub fn homed(&self) -> bool {
        self.state.lock().homed
    }

    /// Never acknowledge `G28`
    pub fn set_hang_on_home(&self, hang: bool) {
        self.state.lock().hang_on_home = hang;
    }

    /// Answer `M114` with a busy message instead of a pose when false
    pub fn set_report_position(&self, report: bool) {
        self.state.lock().report_position = report;
    }

    /// Fail the next connection attempts
    pub fn set_refuse_connect(&self, refuse: bool) {
        self.state.lock().refuse_connect = refuse;
    }

    /// Ports reported for auto-detection
    pub fn set_ports(&self, ports: Vec<SerialPortInfo>) {
        self.state.lock().ports = ports;
    }
}
