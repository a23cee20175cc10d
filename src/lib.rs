//! # PenArm
//!
//! Turns raster images into pen strokes and draws them with a desktop
//! robotic arm running Marlin firmware.
//!
//! ## Architecture
//!
//! PenArm is organized as a workspace with multiple crates:
//!
//! 1. **penarm-core** - Data model, error taxonomy, events, progress counter
//! 2. **penarm-camtools** - Stroke extraction, ordering, mapping, command generation
//! 3. **penarm-communication** - Serial link, Marlin protocol, safe motion, arm state machine
//! 4. **penarm-settings** - Configuration and calibration persistence
//! 5. **penarm** - Drawing sessions and the command-line binary

pub mod cli;
pub mod session;
pub mod setup;

pub use session::{plan, DrawingPlan, DrawingSession, PlanParams, FINISHED_MESSAGE};
pub use cli::Cli;
pub use setup::{arm_config, open_arm, plan_params};

pub use penarm_camtools::{load_raster, ExtractionPreset, RasterImage};
pub use penarm_communication::{Arm, ArmConfig, VirtualArm};
pub use penarm_core::{
    ArmState, CalibrationState, CornerName, DrawingArea, DrawingEvent, Error, ErrorKind,
    MotionCommand, Position, Progress, ProgressCounter, Result,
};
pub use penarm_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
