//! # PenArm Communication
//!
//! Device side of PenArm: the serial link, the Marlin line protocol, the
//! safe motion executor and the arm's calibration/connection state machine.
//! A [`VirtualArm`] stands in for the hardware in tests and dry runs.

pub mod arm;
pub mod communication;
pub mod firmware;

pub use arm::{Arm, ArmConfig, MotionSink, SafeMotionExecutor};

pub use communication::{
    find_arm_port, list_ports, Communicator, ConnectionParams, SerialCommunicator,
    SerialPortInfo, VirtualArm, VirtualArmHandle, VIRTUAL_PORT,
};

pub use firmware::{MarlinCommand, MarlinController, MarlinResponse, MarlinTiming};
