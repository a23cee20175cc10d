//! Marlin firmware support
//!
//! The arm runs a Marlin derivative: plain G-code lines acknowledged with
//! `ok`, `M114` position reports and `M17`/`M84` motor control.

pub mod command_creator;
pub mod controller;
pub mod response_parser;

pub use command_creator::{
    MarlinCommand, MotionType, DEFAULT_FEED_FEEDRATE, DEFAULT_RAPID_FEEDRATE,
};
pub use controller::{MarlinController, MarlinTiming};
pub use response_parser::{find_position, parse_position, parse_response, MarlinResponse};

pub(crate) use controller::pause;
