//! Wiring between the configuration file and the runtime objects

use crate::session::PlanParams;
use anyhow::Context;
use penarm_camtools::ExtractionPreset;
use penarm_communication::{Arm, ArmConfig, Communicator, MarlinTiming, SerialCommunicator, VirtualArm};
use penarm_settings::{CalibrationFile, Config, ConnectionSettings, DrawingSettings};
use std::time::Duration;

/// Arm settings from the connection section
pub fn arm_config(settings: &ConnectionSettings) -> ArmConfig {
    ArmConfig {
        baud_rate: settings.baud_rate,
        startup_delay: Duration::from_millis(settings.startup_delay_ms),
        homing_timeout: Duration::from_secs(settings.homing_timeout_secs),
        timing: MarlinTiming::default().with_ack_timeout(Duration::from_millis(settings.timeout_ms)),
        ..ArmConfig::default()
    }
}

/// Pipeline settings from the drawing section
pub fn plan_params(settings: &DrawingSettings) -> anyhow::Result<PlanParams> {
    let preset: ExtractionPreset = settings
        .preset
        .parse()
        .with_context(|| format!("Invalid preset in config: {}", settings.preset))?;
    Ok(PlanParams {
        extractor: preset.params(),
        pen_lift: settings.pen_lift_height,
        feedrate_draw: settings.feedrate_draw,
        feedrate_move: settings.feedrate_move,
        max_commands: settings.max_commands,
    })
}

/// Build a disconnected arm backed by the configured calibration file
///
/// With `simulate` the arm is a [`VirtualArm`] and all settle pauses are
/// skipped.
pub fn open_arm(config: &Config, simulate: bool) -> anyhow::Result<Arm> {
    let path = config
        .calibration_path()
        .context("Could not locate the calibration file")?;
    tracing::debug!("Calibration record at {}", path.display());

    let (communicator, arm_config): (Box<dyn Communicator>, ArmConfig) = if simulate {
        (Box::new(VirtualArm::new()), ArmConfig::immediate())
    } else {
        (Box::new(SerialCommunicator::new()), arm_config(&config.connection))
    };

    let arm = Arm::new(communicator, Box::new(CalibrationFile::new(path)), arm_config)
        .context("Could not load the calibration record")?;
    Ok(arm)
}
