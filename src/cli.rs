//! Command-line interface
//!
//! Each hardware command loads the configuration, connects to the arm, runs
//! and disconnects again. The calibration record lives in a file, so corners
//! taught by one invocation are used by the next.

use crate::session::{DrawingSession, PlanParams};
use crate::setup::{open_arm, plan_params};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use penarm_camtools::{
    export_gcode, load_raster, render_preview, ExtractionPreset, PathOrderOptimizer,
    StrokeExtractor,
};
use penarm_communication::{find_arm_port, list_ports, Arm};
use penarm_core::{thread_safe, CornerName, DrawingArea, Progress, ThreadSafe};
use penarm_settings::Config;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "penarm")]
#[command(about = "Draw raster images with a desktop robotic arm")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "PENARM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Drive a simulated arm instead of a serial device
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Serial port, overriding the configured and remembered ports
    #[arg(long, global = true, env = "PENARM_PORT")]
    pub port: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Motor holding state
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MotorState {
    /// Hold position (M17)
    Lock,
    /// Release for hand positioning (M84)
    Unlock,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List serial ports and mark the one that looks like an arm
    Ports,
    /// Extract strokes from an image without touching the arm
    Vectorize {
        /// Input image
        image: PathBuf,
        /// Extraction preset
        #[arg(long)]
        preset: Option<ExtractionPreset>,
        /// Width of the target area in mm
        #[arg(long, default_value_t = 100.0)]
        width: f64,
        /// Height of the target area in mm
        #[arg(long, default_value_t = 100.0)]
        height: f64,
        /// Write the generated G-code here
        #[arg(long)]
        gcode: Option<PathBuf>,
        /// Write a PNG preview of the strokes here
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Home the arm
    Home,
    /// Report the current position
    Position,
    /// Lock or unlock the motors
    Motors {
        #[arg(value_enum)]
        state: MotorState,
    },
    /// Save the current position as a calibration corner (1 or 2)
    Corner { corner: CornerName },
    /// Go to the resting position, or save the current position as rest
    Rest {
        #[arg(long)]
        save: bool,
    },
    /// Forget both calibration corners
    ResetCalibration,
    /// Trace the drawing area outline and diagonals
    TestFrame,
    /// Draw an image inside the calibrated area
    Draw {
        /// Input image
        image: PathBuf,
        /// Extraction preset, overriding the configured one
        #[arg(long)]
        preset: Option<ExtractionPreset>,
    },
}

impl Cli {
    /// Execute the selected command
    pub fn run(self) -> anyhow::Result<()> {
        let config = load_config(self.config.as_deref())?;
        match self.command {
            Command::Ports => ports(),
            Command::Vectorize {
                ref image,
                preset,
                width,
                height,
                ref gcode,
                ref preview,
            } => vectorize(
                &config,
                image,
                preset,
                width,
                height,
                gcode.as_deref(),
                preview.as_deref(),
            ),
            ref command => {
                let port = self
                    .port
                    .clone()
                    .or_else(|| config.connection.explicit_port().map(str::to_string));
                let arm = thread_safe(open_arm(&config, self.simulate)?);
                arm.lock()
                    .connect(port.as_deref(), false)
                    .context("Could not connect to the arm")?;
                let result = run_on_arm(&config, command, &arm);
                let mut arm = arm.lock();
                if arm.is_connected() {
                    if let Err(e) = arm.disconnect() {
                        tracing::warn!("Disconnect failed: {}", e);
                    }
                }
                result
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().context("Could not locate the config directory")?,
    };
    let config = Config::load_or_default(&path)
        .with_context(|| format!("Could not load {}", path.display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn ports() -> anyhow::Result<()> {
    let ports = list_ports().context("Could not enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    let detected = find_arm_port(&ports);
    for port in &ports {
        let mark = if detected.as_deref() == Some(port.port_name.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:<20} {}", mark, port.port_name, port.description);
    }
    Ok(())
}

fn vectorize(
    config: &Config,
    image: &Path,
    preset: Option<ExtractionPreset>,
    width: f64,
    height: f64,
    gcode: Option<&Path>,
    preview: Option<&Path>,
) -> anyhow::Result<()> {
    let raster = load_raster(image)?;
    let mut params = plan_params(&config.drawing)?;
    if let Some(preset) = preset {
        params = params.with_preset(preset);
    }
    let area = DrawingArea::new(0.0, 0.0, width, height, 0.0)?;
    let plan = crate::session::plan(&raster, &area, &params)?;

    println!(
        "{} strokes, {} commands, travel {:.0} -> {:.0} px",
        plan.extracted_strokes,
        plan.commands().len(),
        plan.travel.0,
        plan.travel.1
    );
    if plan.skipped_strokes() > 0 {
        println!("{} strokes over the command budget", plan.skipped_strokes());
    }

    if let Some(path) = gcode {
        std::fs::write(path, export_gcode(plan.commands()))
            .with_context(|| format!("Could not write {}", path.display()))?;
        println!("G-code written to {}", path.display());
    }

    if let Some(path) = preview {
        let strokes = StrokeExtractor::new(params.extractor.clone())?.extract(&raster);
        let ordered: Vec<_> = PathOrderOptimizer::order(&strokes)
            .iter()
            .map(|s| s.to_original())
            .collect();
        render_preview(&ordered, raster.width(), raster.height())
            .save(path)
            .with_context(|| format!("Could not write {}", path.display()))?;
        println!("Preview written to {}", path.display());
    }
    Ok(())
}

fn run_on_arm(config: &Config, command: &Command, shared: &ThreadSafe<Arm>) -> anyhow::Result<()> {
    if let Command::Draw { image, preset } = command {
        return draw(config, image, *preset, shared);
    }

    let mut arm = shared.lock();
    match command {
        Command::Home => {
            arm.home()?;
            println!("Homed");
        }
        Command::Position => match arm.position()? {
            Some(position) => println!("{}", position),
            None => println!("Position unavailable"),
        },
        Command::Motors { state } => match state {
            MotorState::Lock => arm.lock_motors()?,
            MotorState::Unlock => arm.unlock_motors()?,
        },
        Command::Corner { corner } => {
            let position = arm.save_corner(*corner)?;
            println!("{} saved at {}", corner, position);
            if arm.is_calibrated() {
                let area = arm.drawing_area()?;
                println!(
                    "Drawing area {:.1} x {:.1} mm at Z {:.1}",
                    area.width(),
                    area.height(),
                    area.z_draw
                );
            }
        }
        Command::Rest { save: true } => {
            let position = arm.save_resting_position()?;
            println!("Resting position saved at {}", position);
        }
        Command::Rest { save: false } => arm.go_to_resting_position()?,
        Command::ResetCalibration => {
            arm.reset_calibration()?;
            println!("Calibration reset");
        }
        Command::TestFrame => arm.draw_test_frame(&mut |step| println!("{}", step))?,
        Command::Ports | Command::Vectorize { .. } | Command::Draw { .. } => {}
    }
    Ok(())
}

fn draw(
    config: &Config,
    image: &Path,
    preset: Option<ExtractionPreset>,
    arm: &ThreadSafe<Arm>,
) -> anyhow::Result<()> {
    let raster = load_raster(image)?;
    let mut params: PlanParams = plan_params(&config.drawing)?;
    if let Some(preset) = preset {
        params = params.with_preset(preset);
    }

    let session = DrawingSession::new(arm.clone());
    let plan = session.plan(&raster, &params)?;
    println!(
        "Drawing {} commands ({} strokes)",
        plan.commands().len(),
        plan.mapped_strokes
    );

    let done = Arc::new(AtomicBool::new(false));
    let reporter = {
        let progress = session.progress();
        let done = done.clone();
        std::thread::spawn(move || {
            let mut last = Progress::default();
            while !done.load(Ordering::Relaxed) {
                let now = progress.snapshot();
                if now.active && (now.current != last.current || now.message != last.message) {
                    println!("{:>5.1}% {}", now.fraction() * 100.0, now.message);
                    last = now;
                }
                std::thread::sleep(Duration::from_millis(500));
            }
        })
    };

    let result = session.execute(&plan);
    done.store(true, Ordering::Relaxed);
    if reporter.join().is_err() {
        tracing::warn!("Progress reporter panicked");
    }
    result?;
    println!("{}", crate::session::FINISHED_MESSAGE);
    Ok(())
}
