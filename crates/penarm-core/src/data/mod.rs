//! Data models for geometry, motion commands and calibration
//!
//! This module provides:
//! - 2D points (image space and the machine XY plane)
//! - 3D machine positions
//! - Motion commands consumed by the executor
//! - The drawing area derived from two taught corners
//! - The persisted calibration record

use crate::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resting position used when none has been saved
pub const DEFAULT_RESTING_POSITION: Position = Position {
    x: 200.0,
    y: 0.0,
    z: 50.0,
};

/// A point in a 2D plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A machine position in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        debug_assert!(
            x.is_finite() && y.is_finite() && z.is_finite(),
            "Position axes must be finite: x={x}, y={y}, z={z}"
        );
        Self { x, y, z }
    }

    /// The XY projection of this position
    pub fn xy(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{:.2} Y{:.2} Z{:.2}", self.x, self.y, self.z)
    }
}

/// Whether the pen is travelling or marking the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    /// Pen lifted, travelling
    Move,
    /// Pen engaged, drawing
    Draw,
}

impl fmt::Display for MotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// One discrete motion of the arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    /// Travel or draw
    pub kind: MotionKind,
    /// Target X in machine coordinates
    pub x: f64,
    /// Target Y in machine coordinates
    pub y: f64,
    /// Target Z in machine coordinates
    pub z: f64,
    /// Feedrate in mm/min
    pub feedrate: f64,
}

impl MotionCommand {
    /// Create a pen-up travel command
    pub fn travel(x: f64, y: f64, z: f64, feedrate: f64) -> Self {
        Self {
            kind: MotionKind::Move,
            x,
            y,
            z,
            feedrate,
        }
    }

    /// Create a pen-down drawing command
    pub fn draw(x: f64, y: f64, z: f64, feedrate: f64) -> Self {
        Self {
            kind: MotionKind::Draw,
            x,
            y,
            z,
            feedrate,
        }
    }

    /// Target position of this command
    pub fn target(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }

    /// Render as a G-code line (`G0` for travel, `G1` for drawing)
    pub fn to_gcode(&self) -> String {
        let word = match self.kind {
            MotionKind::Move => "G0",
            MotionKind::Draw => "G1",
        };
        format!(
            "{} X{:.3} Y{:.3} Z{:.3} F{:.0}",
            word, self.x, self.y, self.z, self.feedrate
        )
    }
}

/// The physical drawing rectangle in machine coordinates
///
/// Always derived from the two taught corners, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingArea {
    /// Minimum X
    pub x_min: f64,
    /// Minimum Y
    pub y_min: f64,
    /// Maximum X
    pub x_max: f64,
    /// Maximum Y
    pub y_max: f64,
    /// Pen-down height
    pub z_draw: f64,
}

impl DrawingArea {
    /// Create an area from explicit bounds
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64, z_draw: f64) -> Result<Self> {
        if x_max <= x_min || y_max <= y_min {
            return Err(ControllerError::InvalidDrawingArea {
                reason: format!(
                    "bounds [{x_min}, {x_max}] x [{y_min}, {y_max}] are empty"
                ),
            }
            .into());
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
            z_draw,
        })
    }

    /// Derive the area spanned by two taught corners
    ///
    /// The pen-down height is taken from the first corner.
    pub fn from_corners(corner1: &Position, corner2: &Position) -> Result<Self> {
        Self::new(
            corner1.x.min(corner2.x),
            corner1.y.min(corner2.y),
            corner1.x.max(corner2.x),
            corner1.y.max(corner2.y),
            corner1.z,
        )
    }

    /// Width along X
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height along Y
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// True when the area is taller than it is wide
    pub fn is_portrait(&self) -> bool {
        self.height() > self.width()
    }

    /// Inclusive bounds check, tolerant of floating point noise at the edges
    pub fn contains(&self, point: &Point) -> bool {
        const EPS: f64 = 1e-9;
        point.x >= self.x_min - EPS
            && point.x <= self.x_max + EPS
            && point.y >= self.y_min - EPS
            && point.y <= self.y_max + EPS
    }
}

/// Name of a taught corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerName {
    /// First corner; also supplies the pen-down height
    Corner1,
    /// Opposite corner
    Corner2,
}

impl fmt::Display for CornerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corner1 => write!(f, "corner1"),
            Self::Corner2 => write!(f, "corner2"),
        }
    }
}

impl std::str::FromStr for CornerName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "corner1" => Ok(Self::Corner1),
            "2" | "corner2" => Ok(Self::Corner2),
            other => Err(format!("unknown corner '{other}', expected corner1 or corner2")),
        }
    }
}

/// The two taught corners
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Corners {
    /// First corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner1: Option<Position>,
    /// Second corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner2: Option<Position>,
}

/// Persisted per-device calibration record
///
/// Serializes to `{"port": .., "corners": {"corner1": .., "corner2": ..},
/// "resting_position": ..}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Last port the arm was connected on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Taught corners
    #[serde(default)]
    pub corners: Corners,
    /// Saved resting position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resting_position: Option<Position>,
}

impl CalibrationState {
    /// Stored corner by name
    pub fn corner(&self, name: CornerName) -> Option<Position> {
        match name {
            CornerName::Corner1 => self.corners.corner1,
            CornerName::Corner2 => self.corners.corner2,
        }
    }

    /// Store a corner
    pub fn set_corner(&mut self, name: CornerName, position: Position) {
        match name {
            CornerName::Corner1 => self.corners.corner1 = Some(position),
            CornerName::Corner2 => self.corners.corner2 = Some(position),
        }
    }

    /// Forget both corners; port and resting position are kept
    pub fn reset_corners(&mut self) {
        self.corners = Corners::default();
    }

    /// Calibration is complete when both corners are present
    pub fn is_calibrated(&self) -> bool {
        self.corners.corner1.is_some() && self.corners.corner2.is_some()
    }

    /// Saved resting position, or the default one
    pub fn resting_or_default(&self) -> Position {
        self.resting_position.unwrap_or(DEFAULT_RESTING_POSITION)
    }

    /// Drawing area spanned by the corners
    pub fn drawing_area(&self) -> Result<DrawingArea> {
        match (self.corners.corner1, self.corners.corner2) {
            (Some(c1), Some(c2)) => DrawingArea::from_corners(&c1, &c2),
            _ => Err(ControllerError::NotCalibrated.into()),
        }
    }
}

/// Lifecycle state of the arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmState {
    /// No device link
    Disconnected,
    /// Linked, corners incomplete
    Connected,
    /// Linked with both corners taught
    Calibrated,
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::Calibrated => write!(f, "Calibrated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn test_drawing_area_from_corners_normalizes() {
        let c1 = Position::new(250.0, 80.0, -42.0);
        let c2 = Position::new(150.0, -60.0, -40.0);
        let area = DrawingArea::from_corners(&c1, &c2).unwrap();
        assert_eq!(area.x_min, 150.0);
        assert_eq!(area.x_max, 250.0);
        assert_eq!(area.y_min, -60.0);
        assert_eq!(area.y_max, 80.0);
        assert_eq!(area.z_draw, -42.0);
        assert_eq!(area.width(), 100.0);
        assert_eq!(area.height(), 140.0);
        assert!(area.is_portrait());
    }

    #[test]
    fn test_degenerate_area_rejected() {
        let c1 = Position::new(100.0, 0.0, 0.0);
        let c2 = Position::new(100.0, 50.0, 0.0);
        let err = DrawingArea::from_corners(&c1, &c2).unwrap_err();
        assert!(matches!(
            err,
            Error::Controller(ControllerError::InvalidDrawingArea { .. })
        ));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let area = DrawingArea::new(0.0, 0.0, 10.0, 10.0, 0.0).unwrap();
        assert!(area.contains(&Point::new(0.0, 0.0)));
        assert!(area.contains(&Point::new(10.0, 10.0)));
        assert!(!area.contains(&Point::new(10.1, 5.0)));
        assert!(!area.contains(&Point::new(5.0, -0.1)));
    }

    #[test]
    fn test_calibration_state_lifecycle() {
        let mut state = CalibrationState::default();
        assert!(!state.is_calibrated());
        assert_eq!(state.resting_or_default(), DEFAULT_RESTING_POSITION);
        assert_eq!(
            state.drawing_area().unwrap_err().kind(),
            ErrorKind::NotCalibrated
        );

        state.set_corner(CornerName::Corner1, Position::new(150.0, -50.0, 0.0));
        assert!(!state.is_calibrated());
        state.set_corner(CornerName::Corner2, Position::new(250.0, 50.0, 0.0));
        assert!(state.is_calibrated());

        state.resting_position = Some(Position::new(1.0, 2.0, 3.0));
        state.reset_corners();
        assert!(!state.is_calibrated());
        assert_eq!(state.resting_or_default(), Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_calibration_record_keys() {
        let mut state = CalibrationState {
            port: Some("/dev/ttyACM0".to_string()),
            ..Default::default()
        };
        state.set_corner(CornerName::Corner1, Position::new(1.0, 2.0, 3.0));
        state.set_corner(CornerName::Corner2, Position::new(4.0, 5.0, 6.0));
        state.resting_position = Some(Position::new(200.0, 0.0, 50.0));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["port"], "/dev/ttyACM0");
        assert_eq!(value["corners"]["corner1"]["x"], 1.0);
        assert_eq!(value["corners"]["corner2"]["z"], 6.0);
        assert_eq!(value["resting_position"]["x"], 200.0);

        let empty: CalibrationState = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CalibrationState::default());
    }

    #[test]
    fn test_corner_name_parse() {
        assert_eq!("1".parse::<CornerName>().unwrap(), CornerName::Corner1);
        assert_eq!("Corner2".parse::<CornerName>().unwrap(), CornerName::Corner2);
        assert!("corner3".parse::<CornerName>().is_err());
    }

    #[test]
    fn test_motion_command_gcode() {
        let cmd = MotionCommand::draw(10.0, 20.5, -1.25, 8000.0);
        assert_eq!(cmd.to_gcode(), "G1 X10.000 Y20.500 Z-1.250 F8000");
        let cmd = MotionCommand::travel(0.0, 0.0, 16.0, 8000.0);
        assert_eq!(cmd.to_gcode(), "G0 X0.000 Y0.000 Z16.000 F8000");
    }
}
