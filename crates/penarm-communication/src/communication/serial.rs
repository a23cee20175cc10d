//! Serial port communication implementation
//!
//! Provides low-level serial port operations for the arm's USB link.
//!
//! Supports:
//! - Port enumeration and arm auto-detection
//! - Opening at a configured baud rate with a firmware startup delay
//! - Short-timeout reads so callers can poll for reply lines

use super::{Communicator, ConnectionParams};
use penarm_core::{ConnectionError, Result};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Read timeout of an open port; also the poll interval of `receive`
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyACM0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Device")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }

    /// Whether the port looks like a USB serial device the arm could be on
    pub fn looks_like_arm(&self) -> bool {
        self.description.contains("USB") || self.description.contains("Serial")
    }
}

/// List serial ports on the system
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::Enumeration {
            reason: e.to_string(),
        }
    })?;

    Ok(ports
        .iter()
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, get_port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb_info) => {
                    let info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                    match &usb_info.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect())
}

/// First port whose description mentions `USB` or `Serial`
pub fn find_arm_port(ports: &[SerialPortInfo]) -> Option<String> {
    ports
        .iter()
        .find(|port| port.looks_like_arm())
        .map(|port| port.port_name.clone())
}

/// Get a user-friendly description for a port
fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Trait for serial port I/O operations
pub trait ReadWrite: Read + Write + Send {}
impl<T: Read + Write + Send> ReadWrite for T {}

/// An open serial port
pub struct RealSerialPort {
    port: Box<dyn ReadWrite>,
    name: String,
}

impl RealSerialPort {
    /// Open a serial port with the given parameters
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        let port = serialport::new(&params.port, params.baud_rate)
            .timeout(READ_TIMEOUT)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open_native()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                ConnectionError::FailedToOpen {
                    port: params.port.clone(),
                    reason: e.to_string(),
                }
            })?;

        Ok(Self {
            port: Box::new(port),
            name: params.port.clone(),
        })
    }

    /// Port name this was opened on
    pub fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = [0u8; 256];
        match self.port.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for RealSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealSerialPort")
            .field("name", &self.name)
            .finish()
    }
}

/// Communicator over a USB serial port
#[derive(Debug, Default)]
pub struct SerialCommunicator {
    port: Option<RealSerialPort>,
    params: Option<ConnectionParams>,
}

impl SerialCommunicator {
    /// Create a closed communicator
    pub fn new() -> Self {
        Self::default()
    }

    fn port_mut(&mut self) -> Result<&mut RealSerialPort> {
        self.port.as_mut().ok_or_else(|| {
            ConnectionError::ConnectionLost {
                reason: "serial port is not open".to_string(),
            }
            .into()
        })
    }
}

impl Communicator for SerialCommunicator {
    fn connect(&mut self, params: &ConnectionParams) -> Result<()> {
        self.disconnect()?;
        let port = RealSerialPort::open(params)?;
        tracing::info!("Opened {} at {} baud", port.name(), params.baud_rate);
        self.port = Some(port);
        self.params = Some(params.clone());

        // the firmware resets when the port opens and prints a banner
        std::thread::sleep(Duration::from_millis(params.startup_delay_ms));
        self.clear_input()
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            tracing::info!("Closed {}", port.name());
        }
        self.params = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port_mut()?;
        port.write_all(data).map_err(|e| ConnectionError::IoError {
            reason: e.to_string(),
        })?;
        Ok(data.len())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        let port = self.port_mut()?;
        port.read_available().map_err(|e| {
            ConnectionError::IoError {
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn connection_params(&self) -> Option<&ConnectionParams> {
        self.params.as_ref()
    }
}
