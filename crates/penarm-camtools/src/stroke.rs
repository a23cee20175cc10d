//! Stroke geometry shared by every pipeline stage

use penarm_core::Point;
use serde::{Deserialize, Serialize};

/// One continuous pen path
///
/// Always holds at least two distinct points. Reordering or reversing
/// produces a new stroke; existing strokes are never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Point>,
    closed: bool,
    thickness_estimate: Option<f64>,
}

impl Stroke {
    /// Build an open stroke, or `None` if the points do not span any distance
    pub fn new(points: Vec<Point>) -> Option<Self> {
        let first = *points.first()?;
        if !points.iter().any(|p| *p != first) {
            return None;
        }
        Some(Self {
            points,
            closed: false,
            thickness_estimate: None,
        })
    }

    /// Mark whether the path returns to its start
    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    /// Attach the average stroke width measured in the source image
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness_estimate = Some(thickness);
        self
    }

    /// Points in traversal order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// First point
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// Last point
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the stroke holds no points, which a built stroke never does
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the path returns to its start
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Average stroke width, if it was measured
    pub fn thickness_estimate(&self) -> Option<f64> {
        self.thickness_estimate
    }

    /// Polyline length
    pub fn length(&self) -> f64 {
        crate::polyline::length(&self.points)
    }

    /// The same path walked the other way
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            points,
            closed: self.closed,
            thickness_estimate: self.thickness_estimate,
        }
    }

    /// Replace the points, keeping the attributes
    pub(crate) fn with_points(&self, points: Vec<Point>) -> Option<Self> {
        Stroke::new(points).map(|s| Self {
            closed: self.closed,
            thickness_estimate: self.thickness_estimate,
            ..s
        })
    }
}

/// Traversal direction chosen by the path order optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// As extracted
    Forward,
    /// Walked end to start
    Reversed,
}

/// A stroke in its final traversal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedStroke {
    stroke: Stroke,
    direction: Direction,
}

impl OrientedStroke {
    /// Orient a stroke, reversing its points when `direction` is `Reversed`
    pub fn new(stroke: Stroke, direction: Direction) -> Self {
        let stroke = match direction {
            Direction::Forward => stroke,
            Direction::Reversed => stroke.reversed(),
        };
        Self { stroke, direction }
    }

    /// Wrap a stroke whose points are already in traversal order
    pub(crate) fn from_traversal(stroke: Stroke, direction: Direction) -> Self {
        Self { stroke, direction }
    }

    /// Points in traversal order
    pub fn points(&self) -> &[Point] {
        self.stroke.points()
    }

    /// Where the pen goes down
    pub fn start(&self) -> Point {
        self.stroke.start()
    }

    /// Where the pen lifts
    pub fn end(&self) -> Point {
        self.stroke.end()
    }

    /// Chosen direction relative to the extracted stroke
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Oriented stroke data
    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Recover the stroke as originally extracted
    pub fn to_original(&self) -> Stroke {
        match self.direction {
            Direction::Forward => self.stroke.clone(),
            Direction::Reversed => self.stroke.reversed(),
        }
    }
}
