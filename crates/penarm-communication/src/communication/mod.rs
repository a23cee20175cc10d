//! Device link layer
//!
//! A [`Communicator`] moves raw bytes to and from the arm. Line framing and
//! acknowledgement handling live one level up in the Marlin controller, so a
//! communicator only has to open, close, write and drain.
//!
//! Implementations:
//! - [`SerialCommunicator`]: USB serial link through the `serialport` crate
//! - [`VirtualArm`]: in-process simulated arm for tests and dry runs

pub mod serial;
pub mod virtual_arm;

pub use serial::{find_arm_port, list_ports, SerialCommunicator, SerialPortInfo};
pub use virtual_arm::{VirtualArm, VirtualArmHandle, VIRTUAL_PORT};

use penarm_core::Result;
use serde::{Deserialize, Serialize};

/// Default baud rate of the arm's USB serial link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Parameters for opening a device link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g. "/dev/ttyACM0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Time the firmware needs after the port opens before it accepts commands
    pub startup_delay_ms: u64,
}

impl ConnectionParams {
    /// Parameters for `port` with the default baud rate and startup delay
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the startup delay
    pub fn with_startup_delay_ms(mut self, startup_delay_ms: u64) -> Self {
        self.startup_delay_ms = startup_delay_ms;
        self
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            startup_delay_ms: 2000,
        }
    }
}

/// Byte-level link to the arm
pub trait Communicator: Send {
    /// Open the link described by `params`
    fn connect(&mut self, params: &ConnectionParams) -> Result<()>;

    /// Close the link; closing a closed link is not an error
    fn disconnect(&mut self) -> Result<()>;

    /// Whether the link is open
    fn is_connected(&self) -> bool;

    /// Write raw bytes, returning how many were written
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever bytes are available without blocking for long
    ///
    /// An empty vector means nothing arrived within the link's poll interval.
    fn receive(&mut self) -> Result<Vec<u8>>;

    /// Discard unread input
    fn clear_input(&mut self) -> Result<()> {
        while !self.receive()?.is_empty() {}
        Ok(())
    }

    /// Ports this link can be opened on, for auto-detection
    fn available_ports(&self) -> Result<Vec<SerialPortInfo>> {
        list_ports()
    }

    /// Parameters of the open link
    fn connection_params(&self) -> Option<&ConnectionParams>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_params_defaults() {
        let params = ConnectionParams::new("/dev/ttyACM0");
        assert_eq!(params.port, "/dev/ttyACM0");
        assert_eq!(params.baud_rate, 115_200);
        assert_eq!(params.startup_delay_ms, 2000);

        let params = params.with_baud_rate(9600).with_startup_delay_ms(0);
        assert_eq!(params.baud_rate, 9600);
        assert_eq!(params.startup_delay_ms, 0);
    }
}
