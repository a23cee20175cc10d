//! Command Generator
//!
//! Turns machine-space strokes into the `Move`/`Draw` command list the safe
//! motion executor replays. Each stroke becomes a pen-up travel to its first
//! point, a touch-down, one draw per following point and a trailing lift.

use crate::segment_sampler::DrawPath;
use crate::stroke::OrientedStroke;
use penarm_core::{DrawingArea, MotionCommand, MotionKind, Point};
use serde::{Deserialize, Serialize};

/// Command generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    /// Pen-down height
    pub z_draw: f64,
    /// Pen-up height
    pub z_up: f64,
    /// Feedrate for `Draw` commands (mm/min)
    pub feedrate_draw: f64,
    /// Feedrate for `Move` commands (mm/min)
    pub feedrate_move: f64,
    /// Upper bound on the number of commands
    pub max_commands: usize,
    /// Points outside these bounds lift the pen; `None` draws everything
    pub bounds: Option<DrawingArea>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            z_draw: 0.0,
            z_up: 16.0,
            feedrate_draw: 8000.0,
            feedrate_move: 8000.0,
            max_commands: 5000,
            bounds: None,
        }
    }
}

impl GeneratorParams {
    /// Parameters for drawing inside `area`, lifting `pen_lift` above its surface
    pub fn for_area(area: &DrawingArea, pen_lift: f64) -> Self {
        Self {
            z_draw: area.z_draw,
            z_up: area.z_draw + pen_lift,
            bounds: Some(*area),
            ..Self::default()
        }
    }

    /// Set both feedrates
    pub fn with_feedrates(mut self, draw: f64, travel: f64) -> Self {
        self.feedrate_draw = draw;
        self.feedrate_move = travel;
        self
    }

    /// Set the command budget
    pub fn with_max_commands(mut self, max_commands: usize) -> Self {
        self.max_commands = max_commands;
        self
    }
}

/// Output of command generation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationResult {
    /// Commands in execution order
    pub commands: Vec<MotionCommand>,
    /// Strokes whose commands were emitted
    pub processed_strokes: usize,
    /// Strokes left out because the budget ran out
    pub skipped_strokes: usize,
    /// The last processed stroke was cut short by the budget
    pub truncated: bool,
}

impl GenerationResult {
    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is to be drawn
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Motion command generator
#[derive(Debug, Clone, Default)]
pub struct CommandGenerator {
    params: GeneratorParams,
}

impl CommandGenerator {
    /// Create a generator
    pub fn new(params: GeneratorParams) -> Self {
        Self { params }
    }

    /// Parameters in use
    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Generate commands for strokes in drawing order
    ///
    /// Generation stops once the budget is spent. The stroke that does not fit
    /// is drawn as far as the budget allows and closed with a lift, so the
    /// result never exceeds `max_commands` and always ends with the pen up.
    pub fn generate(&self, strokes: &[OrientedStroke]) -> GenerationResult {
        self.generate_from(strokes.len(), strokes.iter().map(|s| s.points().to_vec()))
    }

    /// Generate commands for line and curve paths, sampling curves first
    pub fn generate_paths(&self, paths: &[DrawPath]) -> GenerationResult {
        self.generate_from(paths.len(), paths.iter().map(DrawPath::points))
    }

    fn generate_from(
        &self,
        total: usize,
        strokes: impl Iterator<Item = Vec<Point>>,
    ) -> GenerationResult {
        let mut result = GenerationResult::default();

        for points in strokes {
            let commands = self.stroke_commands(&points);
            let room = self.params.max_commands - result.commands.len();
            if commands.len() <= room {
                result.commands.extend(commands);
                result.processed_strokes += 1;
                continue;
            }
            if let Some(partial) = self.truncate(&commands, room) {
                result.commands.extend(partial);
                result.processed_strokes += 1;
                result.truncated = true;
            }
            break;
        }

        result.skipped_strokes = total - result.processed_strokes;
        if result.skipped_strokes > 0 {
            tracing::warn!(
                "Command budget of {} reached, skipped {} of {} strokes",
                self.params.max_commands,
                result.skipped_strokes,
                total
            );
        }
        tracing::debug!(
            "Generated {} commands for {} strokes",
            result.commands.len(),
            result.processed_strokes
        );

        result
    }

    /// Leading commands of a stroke that fit in `room`, ending with a lift
    fn truncate(&self, commands: &[MotionCommand], room: usize) -> Option<Vec<MotionCommand>> {
        // travel, touch-down and a lift are the least worth emitting
        if room < 3 {
            return None;
        }
        let mut partial = commands[..room - 1].to_vec();
        if let Some(last) = partial.last().copied() {
            if last.kind == MotionKind::Draw {
                partial.push(MotionCommand::travel(
                    last.x,
                    last.y,
                    self.params.z_up,
                    self.params.feedrate_move,
                ));
            }
        }
        Some(partial)
    }

    fn in_bounds(&self, p: &Point) -> bool {
        self.params.bounds.map_or(true, |area| area.contains(p))
    }

    fn stroke_commands(&self, points: &[Point]) -> Vec<MotionCommand> {
        let GeneratorParams {
            z_draw,
            z_up,
            feedrate_draw,
            feedrate_move,
            ..
        } = self.params;

        let mut commands = Vec::with_capacity(points.len() + 2);
        let mut last_down: Option<Point> = None;

        for p in points {
            if !self.in_bounds(p) {
                if let Some(last) = last_down.take() {
                    commands.push(MotionCommand::travel(last.x, last.y, z_up, feedrate_move));
                }
                continue;
            }
            if last_down.is_none() {
                commands.push(MotionCommand::travel(p.x, p.y, z_up, feedrate_move));
            }
            commands.push(MotionCommand::draw(p.x, p.y, z_draw, feedrate_draw));
            last_down = Some(*p);
        }

        if let Some(last) = last_down {
            commands.push(MotionCommand::travel(last.x, last.y, z_up, feedrate_move));
        }

        commands
    }
}

/// Generate commands with explicit heights, feedrates and budget
pub fn generate(
    strokes: &[OrientedStroke],
    z_draw: f64,
    z_up: f64,
    feedrate_draw: f64,
    feedrate_move: f64,
    max_commands: usize,
) -> GenerationResult {
    CommandGenerator::new(GeneratorParams {
        z_draw,
        z_up,
        feedrate_draw,
        feedrate_move,
        max_commands,
        bounds: None,
    })
    .generate(strokes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment_sampler::{PathSegment, CURVE_SAMPLES};
    use crate::stroke::{Direction, Stroke};

    fn oriented(raw: &[(f64, f64)]) -> OrientedStroke {
        let stroke = Stroke::new(raw.iter().map(|&p| p.into()).collect()).unwrap();
        OrientedStroke::new(stroke, Direction::Forward)
    }

    fn kinds(commands: &[MotionCommand]) -> Vec<MotionKind> {
        commands.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_single_stroke_shape() {
        let stroke = oriented(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let result = generate(&[stroke], 0.0, 16.0, 1000.0, 3000.0, 100);

        use MotionKind::{Draw, Move};
        assert_eq!(
            kinds(&result.commands),
            vec![Move, Draw, Draw, Draw, Move]
        );
        let first = result.commands[0];
        assert_eq!((first.x, first.y, first.z, first.feedrate), (0.0, 0.0, 16.0, 3000.0));
        let touch = result.commands[1];
        assert_eq!((touch.x, touch.y, touch.z, touch.feedrate), (0.0, 0.0, 0.0, 1000.0));
        let lift = result.commands[4];
        assert_eq!((lift.x, lift.y, lift.z), (10.0, 10.0, 16.0));
        assert_eq!(result.processed_strokes, 1);
        assert_eq!(result.skipped_strokes, 0);
    }

    #[test]
    fn test_budget_stops_when_spent() {
        let strokes: Vec<_> = (0..5)
            .map(|i| oriented(&[(i as f64, 0.0), (i as f64, 10.0)]))
            .collect();
        // each stroke needs 4 commands; the 2 left over cannot draw anything
        let result = generate(&strokes, 0.0, 10.0, 1.0, 1.0, 10);
        assert_eq!(result.len(), 8);
        assert_eq!(result.processed_strokes, 2);
        assert_eq!(result.skipped_strokes, 3);
        assert!(!result.truncated);
        assert_eq!(result.commands.last().map(|c| c.kind), Some(MotionKind::Move));
    }

    #[test]
    fn test_stroke_longer_than_budget_is_cut_short() {
        let points: Vec<(f64, f64)> = (0..100).map(|i| (i as f64, (i % 2) as f64)).collect();
        let result = generate(&[oriented(&points)], 0.0, 10.0, 1.0, 1.0, 50);

        assert_eq!(result.len(), 50);
        assert_eq!(result.processed_strokes, 1);
        assert_eq!(result.skipped_strokes, 0);
        assert!(result.truncated);

        use MotionKind::{Draw, Move};
        assert_eq!(result.commands[0].kind, Move);
        assert!(result.commands[1..49].iter().all(|c| c.kind == Draw));
        // lift straight up from the last drawn point
        let (draw, lift) = (result.commands[48], result.commands[49]);
        assert_eq!(lift.kind, Move);
        assert_eq!((lift.x, lift.y, lift.z), (draw.x, draw.y, 10.0));
        assert_eq!(draw.x, 47.0);
    }

    #[test]
    fn test_truncation_fills_budget_after_whole_strokes() {
        let short = oriented(&[(0.0, 0.0), (1.0, 0.0)]);
        let long = oriented(&[(0.0, 5.0), (1.0, 5.0), (2.0, 5.0), (3.0, 5.0), (4.0, 5.0)]);
        let tail = oriented(&[(0.0, 9.0), (1.0, 9.0)]);
        // 4 for the short stroke, then 3 of the long one plus a lift
        let result = generate(&[short, long, tail], 0.0, 10.0, 1.0, 1.0, 8);
        assert_eq!(result.len(), 8);
        assert_eq!(result.processed_strokes, 2);
        assert_eq!(result.skipped_strokes, 1);
        assert!(result.truncated);
        assert_eq!(result.commands[7].z, 10.0);
    }

    #[test]
    fn test_zero_budget() {
        let result = generate(&[oriented(&[(0.0, 0.0), (1.0, 1.0)])], 0.0, 10.0, 1.0, 1.0, 0);
        assert!(result.is_empty());
        assert_eq!(result.skipped_strokes, 1);
    }

    #[test]
    fn test_bounds_split_pen_down_runs() {
        let area = DrawingArea::new(0.0, 0.0, 10.0, 10.0, -2.0).unwrap();
        let generator = CommandGenerator::new(GeneratorParams::for_area(&area, 5.0));
        let stroke = oriented(&[(1.0, 1.0), (5.0, 1.0), (20.0, 1.0), (8.0, 2.0), (9.0, 2.0)]);
        let result = generator.generate(&[stroke]);

        use MotionKind::{Draw, Move};
        assert_eq!(
            kinds(&result.commands),
            vec![Move, Draw, Draw, Move, Move, Draw, Draw, Move]
        );
        assert_eq!(result.commands[3].x, 5.0);
        assert_eq!(result.commands[3].z, 3.0);
        assert!(result.commands.iter().all(|c| c.x <= 10.0));
        assert!(result
            .commands
            .iter()
            .filter(|c| c.kind == Draw)
            .all(|c| c.z == -2.0));
    }

    #[test]
    fn test_curves_are_sampled() {
        let path = DrawPath::new(Point::new(0.0, 0.0)).then(PathSegment::QuadraticBezier {
            ctrl: Point::new(5.0, 10.0),
            to: Point::new(10.0, 0.0),
        });
        let result = CommandGenerator::default().generate_paths(&[path]);
        // travel + touch-down + one draw per sample + lift
        assert_eq!(result.len(), 2 + CURVE_SAMPLES + 1);
    }

    #[test]
    fn test_params_for_area() {
        let area = DrawingArea::new(0.0, 0.0, 10.0, 10.0, -3.0).unwrap();
        let params = GeneratorParams::for_area(&area, 16.0);
        assert_eq!(params.z_draw, -3.0);
        assert_eq!(params.z_up, 13.0);
        assert_eq!(params.max_commands, 5000);
    }
}
