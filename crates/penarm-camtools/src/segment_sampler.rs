//! Segment Sampler
//!
//! Flattens curved path primitives into straight line points for the
//! command generator. Every curve is sampled at [`CURVE_SAMPLES`] equal
//! parametric steps.

use crate::stroke::Stroke;
use lyon::geom::euclid::{point2, vec2, Angle};
use lyon::geom::{Arc, CubicBezierSegment, QuadraticBezierSegment};
use penarm_core::Point;
use serde::{Deserialize, Serialize};

/// Parametric steps per curved segment
pub const CURVE_SAMPLES: usize = 20;

/// One primitive of a drawing path, continuing from the previous end point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathSegment {
    /// Straight line
    Line {
        /// End point
        to: Point,
    },
    /// Quadratic bezier curve
    QuadraticBezier {
        /// Control point
        ctrl: Point,
        /// End point
        to: Point,
    },
    /// Cubic bezier curve
    CubicBezier {
        /// First control point
        ctrl1: Point,
        /// Second control point
        ctrl2: Point,
        /// End point
        to: Point,
    },
    /// Circular arc; angles in radians, positive sweep is counter-clockwise
    Arc {
        /// Arc center
        center: Point,
        /// Arc radius
        radius: f64,
        /// Angle of the first point
        start_angle: f64,
        /// Signed angle swept
        sweep_angle: f64,
    },
}

impl PathSegment {
    /// Where this segment ends
    pub fn end(&self) -> Point {
        match *self {
            PathSegment::Line { to }
            | PathSegment::QuadraticBezier { to, .. }
            | PathSegment::CubicBezier { to, .. } => to,
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                sweep_angle,
            } => {
                let angle = start_angle + sweep_angle;
                Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            }
        }
    }

    /// True for the primitives that get sampled
    pub fn is_curve(&self) -> bool {
        !matches!(self, PathSegment::Line { .. })
    }
}

/// Points along `segment` starting after `from`
///
/// A line yields its end point. Curves yield [`CURVE_SAMPLES`] points at
/// `t = 1/20 .. 20/20`, the last of which is the segment end.
pub fn sample_segment(from: Point, segment: &PathSegment) -> Vec<Point> {
    let steps = (1..=CURVE_SAMPLES).map(|i| i as f64 / CURVE_SAMPLES as f64);
    match *segment {
        PathSegment::Line { to } => vec![to],
        PathSegment::QuadraticBezier { ctrl, to } => {
            let curve = QuadraticBezierSegment {
                from: point2(from.x, from.y),
                ctrl: point2(ctrl.x, ctrl.y),
                to: point2(to.x, to.y),
            };
            steps
                .map(|t| {
                    let p = curve.sample(t);
                    Point::new(p.x, p.y)
                })
                .collect()
        }
        PathSegment::CubicBezier { ctrl1, ctrl2, to } => {
            let curve = CubicBezierSegment {
                from: point2(from.x, from.y),
                ctrl1: point2(ctrl1.x, ctrl1.y),
                ctrl2: point2(ctrl2.x, ctrl2.y),
                to: point2(to.x, to.y),
            };
            steps
                .map(|t| {
                    let p = curve.sample(t);
                    Point::new(p.x, p.y)
                })
                .collect()
        }
        PathSegment::Arc {
            center,
            radius,
            start_angle,
            sweep_angle,
        } => {
            let arc = Arc {
                center: point2(center.x, center.y),
                radii: vec2(radius, radius),
                start_angle: Angle::radians(start_angle),
                sweep_angle: Angle::radians(sweep_angle),
                x_rotation: Angle::radians(0.0),
            };
            steps
                .map(|t| {
                    let p = arc.sample(t);
                    Point::new(p.x, p.y)
                })
                .collect()
        }
    }
}

/// A pen path made of line and curve primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawPath {
    /// Where the pen touches down
    pub start: Point,
    /// Primitives in drawing order
    pub segments: Vec<PathSegment>,
}

impl DrawPath {
    /// Start a path at `start`
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    /// Append a primitive
    pub fn then(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Build a straight-line path through `points`
    pub fn polyline(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(Self {
            start: *first,
            segments: rest.iter().map(|&to| PathSegment::Line { to }).collect(),
        })
    }

    /// Flattened points, starting with `start`
    pub fn points(&self) -> Vec<Point> {
        let mut points = vec![self.start];
        let mut cursor = self.start;
        for segment in &self.segments {
            points.extend(sample_segment(cursor, segment));
            cursor = segment.end();
        }
        points
    }

    /// Flatten into a stroke, or `None` if the path has no extent
    pub fn to_stroke(&self) -> Option<Stroke> {
        Stroke::new(self.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: Point, b: Point) -> bool {
        a.distance_to(&b) < 1e-9
    }

    #[test]
    fn test_line_is_single_point() {
        let pts = sample_segment(
            Point::new(0.0, 0.0),
            &PathSegment::Line {
                to: Point::new(5.0, 5.0),
            },
        );
        assert_eq!(pts, vec![Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_cubic_has_twenty_samples_ending_at_target() {
        let segment = PathSegment::CubicBezier {
            ctrl1: Point::new(0.0, 10.0),
            ctrl2: Point::new(10.0, 10.0),
            to: Point::new(10.0, 0.0),
        };
        let pts = sample_segment(Point::new(0.0, 0.0), &segment);
        assert_eq!(pts.len(), CURVE_SAMPLES);
        assert!(close(pts[CURVE_SAMPLES - 1], Point::new(10.0, 0.0)));
        // symmetric curve peaks at 7.5 in the middle
        assert!(close(pts[9], Point::new(5.0, 7.5)));
    }

    #[test]
    fn test_quadratic_midpoint() {
        let segment = PathSegment::QuadraticBezier {
            ctrl: Point::new(5.0, 10.0),
            to: Point::new(10.0, 0.0),
        };
        let pts = sample_segment(Point::new(0.0, 0.0), &segment);
        assert_eq!(pts.len(), CURVE_SAMPLES);
        assert!(close(pts[9], Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_arc_stays_on_circle() {
        let segment = PathSegment::Arc {
            center: Point::new(10.0, 10.0),
            radius: 5.0,
            start_angle: 0.0,
            sweep_angle: PI,
        };
        let pts = sample_segment(Point::new(15.0, 10.0), &segment);
        assert_eq!(pts.len(), CURVE_SAMPLES);
        for p in &pts {
            assert!((p.distance_to(&Point::new(10.0, 10.0)) - 5.0).abs() < 1e-9);
        }
        assert!(close(pts[9], Point::new(10.0, 15.0)));
        assert!(close(segment.end(), Point::new(5.0, 10.0)));
    }

    #[test]
    fn test_segment_json_is_tagged() {
        let segment = PathSegment::QuadraticBezier {
            ctrl: Point::new(5.0, 10.0),
            to: Point::new(10.0, 0.0),
        };
        let json = serde_json::to_value(segment).unwrap();
        assert_eq!(json["type"], "quadratic_bezier");
        assert_eq!(json["ctrl"]["x"], 5.0);

        let path: DrawPath = serde_json::from_str(
            r#"{"start":{"x":0.0,"y":0.0},"segments":[{"type":"line","to":{"x":3.0,"y":4.0}}]}"#,
        )
        .unwrap();
        assert_eq!(path.points(), vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)]);
        assert!(serde_json::from_str::<PathSegment>(r#"{"type":"spline"}"#).is_err());
    }

    #[test]
    fn test_path_flattening() {
        let path = DrawPath::new(Point::new(0.0, 0.0))
            .then(PathSegment::Line {
                to: Point::new(10.0, 0.0),
            })
            .then(PathSegment::Arc {
                center: Point::new(10.0, 5.0),
                radius: 5.0,
                start_angle: -FRAC_PI_2,
                sweep_angle: PI,
            });
        let pts = path.points();
        assert_eq!(pts.len(), 2 + CURVE_SAMPLES);
        assert!(close(*pts.last().unwrap(), Point::new(10.0, 10.0)));
        assert!(path.to_stroke().is_some());
        assert!(DrawPath::new(Point::new(1.0, 1.0)).to_stroke().is_none());
    }
}
