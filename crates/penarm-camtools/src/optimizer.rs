//! Path Order Optimizer
//!
//! Orders strokes to cut pen-up travel with a greedy nearest-neighbour pass.

use crate::stroke::{Direction, OrientedStroke, Stroke};
use penarm_core::Point;

/// Greedy nearest-neighbour stroke ordering
#[derive(Debug, Default)]
pub struct PathOrderOptimizer;

impl PathOrderOptimizer {
    /// Order `strokes` so each one starts near where the previous ended
    ///
    /// The first stroke keeps its place and orientation. Every following pick
    /// is the remaining stroke endpoint closest to the current pen position;
    /// ties go to the earlier stroke, then to the forward orientation. Every
    /// input stroke appears exactly once in the output.
    pub fn order(strokes: &[Stroke]) -> Vec<OrientedStroke> {
        let mut ordered = Vec::with_capacity(strokes.len());
        let Some(first) = strokes.first() else {
            return ordered;
        };

        let mut remaining: Vec<usize> = (1..strokes.len()).collect();
        let mut current_end = first.end();
        ordered.push(OrientedStroke::new(first.clone(), Direction::Forward));

        while !remaining.is_empty() {
            let mut best_slot = 0;
            let mut best_direction = Direction::Forward;
            let mut best_distance = f64::INFINITY;

            for (slot, &idx) in remaining.iter().enumerate() {
                let stroke = &strokes[idx];
                let to_start = current_end.distance_to(&stroke.start());
                if to_start < best_distance {
                    best_distance = to_start;
                    best_slot = slot;
                    best_direction = Direction::Forward;
                }
                let to_end = current_end.distance_to(&stroke.end());
                if to_end < best_distance {
                    best_distance = to_end;
                    best_slot = slot;
                    best_direction = Direction::Reversed;
                }
            }

            let idx = remaining.remove(best_slot);
            let next = OrientedStroke::new(strokes[idx].clone(), best_direction);
            current_end = next.end();
            ordered.push(next);
        }

        tracing::debug!(
            "Ordered {} strokes, pen-up travel {:.1}",
            ordered.len(),
            Self::travel_distance(&ordered)
        );
        ordered
    }

    /// Total pen-up distance between consecutive strokes
    pub fn travel_distance(strokes: &[OrientedStroke]) -> f64 {
        travel(strokes.iter().map(|s| (s.start(), s.end())))
    }

    /// Pen-up distance when the strokes are drawn as given
    pub fn input_travel_distance(strokes: &[Stroke]) -> f64 {
        travel(strokes.iter().map(|s| (s.start(), s.end())))
    }
}

fn travel(mut ends: impl Iterator<Item = (Point, Point)>) -> f64 {
    let Some((_, mut last_end)) = ends.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for (start, end) in ends {
        total += last_end.distance_to(&start);
        last_end = end;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(raw: &[(f64, f64)]) -> Stroke {
        Stroke::new(raw.iter().map(|&p| p.into()).collect()).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(PathOrderOptimizer::order(&[]).is_empty());
        assert_eq!(PathOrderOptimizer::travel_distance(&[]), 0.0);
    }

    #[test]
    fn test_first_stroke_keeps_orientation() {
        let strokes = vec![
            stroke(&[(10.0, 0.0), (0.0, 0.0)]),
            stroke(&[(50.0, 0.0), (60.0, 0.0)]),
        ];
        let ordered = PathOrderOptimizer::order(&strokes);
        assert_eq!(ordered[0].direction(), Direction::Forward);
        assert_eq!(ordered[0].start(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_reverses_when_end_is_closer() {
        let strokes = vec![
            stroke(&[(0.0, 0.0), (10.0, 0.0)]),
            stroke(&[(30.0, 0.0), (11.0, 0.0)]),
        ];
        let ordered = PathOrderOptimizer::order(&strokes);
        assert_eq!(ordered[1].direction(), Direction::Reversed);
        assert_eq!(ordered[1].start(), Point::new(11.0, 0.0));
        assert_eq!(ordered[1].to_original(), strokes[1]);
    }

    #[test]
    fn test_picks_nearest_next() {
        let strokes = vec![
            stroke(&[(0.0, 0.0), (10.0, 0.0)]),
            stroke(&[(100.0, 0.0), (110.0, 0.0)]),
            stroke(&[(12.0, 0.0), (20.0, 0.0)]),
            stroke(&[(50.0, 0.0), (60.0, 0.0)]),
        ];
        let ordered = PathOrderOptimizer::order(&strokes);
        let starts: Vec<f64> = ordered.iter().map(|s| s.start().x).collect();
        assert_eq!(starts, vec![0.0, 12.0, 50.0, 100.0]);
        assert!(
            PathOrderOptimizer::travel_distance(&ordered)
                < PathOrderOptimizer::input_travel_distance(&strokes)
        );
    }

    #[test]
    fn test_tie_prefers_earlier_then_forward() {
        let strokes = vec![
            stroke(&[(0.0, 0.0), (10.0, 0.0)]),
            stroke(&[(15.0, 0.0), (15.0, 10.0)]),
            stroke(&[(5.0, 0.0), (5.0, 10.0)]),
        ];
        let ordered = PathOrderOptimizer::order(&strokes);
        assert_eq!(ordered[1].stroke(), &strokes[1]);
        assert_eq!(ordered[1].direction(), Direction::Forward);
    }
}
