//! Endpoint joining
//!
//! Grows long continuous strokes out of short traced fragments so the pen is
//! lifted less often.

use crate::polyline;
use crate::stroke::Stroke;
use penarm_core::Point;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    /// Append the candidate as is
    TailToStart,
    /// Append the candidate reversed
    TailToEnd,
    /// Prepend the candidate as is
    HeadToEnd,
    /// Prepend the candidate reversed
    HeadToStart,
}

/// Join strokes whose endpoints are closer than `threshold`
///
/// Fragments are consumed longest first. Each growing stroke keeps taking the
/// nearest open fragment at either end until none is strictly within
/// `threshold`. Closed strokes pass through untouched. A non-positive
/// threshold disables joining.
pub fn join_strokes(strokes: Vec<Stroke>, threshold: f64) -> Vec<Stroke> {
    if threshold.is_nan() || threshold <= 0.0 || strokes.len() < 2 {
        return strokes;
    }

    let mut order: Vec<usize> = (0..strokes.len()).collect();
    order.sort_by(|&a, &b| {
        strokes[b]
            .length()
            .partial_cmp(&strokes[a].length())
            .unwrap_or(Ordering::Equal)
    });

    let mut used = vec![false; strokes.len()];
    let mut joined = Vec::with_capacity(strokes.len());

    for &seed in &order {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let base = &strokes[seed];
        if base.is_closed() {
            joined.push(base.clone());
            continue;
        }

        let mut points: Vec<Point> = base.points().to_vec();
        let mut merged = 0usize;
        while let Some((candidate, attach)) = nearest(&strokes, &order, &used, &points, threshold)
        {
            used[candidate] = true;
            merged += 1;
            let other = strokes[candidate].points();
            match attach {
                Attach::TailToStart => points.extend_from_slice(other),
                Attach::TailToEnd => points.extend(other.iter().rev()),
                Attach::HeadToEnd => {
                    points.splice(0..0, other.iter().copied());
                }
                Attach::HeadToStart => {
                    points.splice(0..0, other.iter().rev().copied());
                }
            }
        }

        if merged == 0 {
            joined.push(base.clone());
            continue;
        }

        let points = polyline::dedup(&points);
        let closed = points.len() > 2 && points.first() == points.last();
        if let Some(stroke) = Stroke::new(points) {
            let stroke = stroke.with_closed(closed);
            joined.push(match base.thickness_estimate() {
                Some(t) => stroke.with_thickness(t),
                None => stroke,
            });
        }
    }

    tracing::debug!("Joined {} strokes into {}", strokes.len(), joined.len());
    joined
}

fn nearest(
    strokes: &[Stroke],
    order: &[usize],
    used: &[bool],
    points: &[Point],
    threshold: f64,
) -> Option<(usize, Attach)> {
    let head = points[0];
    let tail = points[points.len() - 1];
    let mut best: Option<(usize, Attach, f64)> = None;

    for &idx in order {
        let candidate = &strokes[idx];
        if used[idx] || candidate.is_closed() {
            continue;
        }
        let options = [
            (Attach::TailToStart, tail.distance_to(&candidate.start())),
            (Attach::TailToEnd, tail.distance_to(&candidate.end())),
            (Attach::HeadToEnd, head.distance_to(&candidate.end())),
            (Attach::HeadToStart, head.distance_to(&candidate.start())),
        ];
        for (attach, distance) in options {
            let closer = best.map_or(true, |(_, _, d)| distance < d);
            if distance < threshold && closer {
                best = Some((idx, attach, distance));
            }
        }
    }

    best.map(|(idx, attach, _)| (idx, attach))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(raw: &[(f64, f64)]) -> Stroke {
        Stroke::new(raw.iter().map(|&p| p.into()).collect()).unwrap()
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let a = stroke(&[(0.0, 0.0), (10.0, 0.0)]);
        let b = stroke(&[(15.0, 0.0), (20.0, 0.0)]);

        let out = join_strokes(vec![a.clone(), b.clone()], 5.0);
        assert_eq!(out.len(), 2);

        let out = join_strokes(vec![a, b], 5.0 + 1e-9);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].points().len(), 4);
    }

    #[test]
    fn test_joins_reversed_fragment_at_tail() {
        let a = stroke(&[(0.0, 0.0), (10.0, 0.0)]);
        let b = stroke(&[(5.0, 5.0), (11.0, 1.0)]);
        let out = join_strokes(vec![a, b], 3.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].end(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_extends_at_head() {
        let long = stroke(&[(10.0, 0.0), (30.0, 0.0)]);
        let short = stroke(&[(0.0, 0.0), (9.0, 0.0)]);
        let out = join_strokes(vec![short, long], 2.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start(), Point::new(0.0, 0.0));
        assert_eq!(out[0].end(), Point::new(30.0, 0.0));
    }

    #[test]
    fn test_chain_of_fragments() {
        let parts = vec![
            stroke(&[(0.0, 0.0), (4.0, 0.0)]),
            stroke(&[(5.0, 0.0), (9.0, 0.0)]),
            stroke(&[(10.0, 0.0), (20.0, 0.0)]),
        ];
        let out = join_strokes(parts, 1.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].length(), 20.0);
    }

    #[test]
    fn test_closing_join_marks_closed() {
        let a = stroke(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let b = stroke(&[(10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let out = join_strokes(vec![a, b], 0.5);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_closed());
        assert_eq!(out[0].points().len(), 5);
    }

    #[test]
    fn test_closed_strokes_untouched() {
        let ring = stroke(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]).with_closed(true);
        let near = stroke(&[(0.5, 0.0), (0.5, -5.0)]);
        let out = join_strokes(vec![ring.clone(), near], 2.0);
        assert_eq!(out.len(), 2);
        assert!(out.contains(&ring));
    }

    #[test]
    fn test_disabled() {
        let a = stroke(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = stroke(&[(1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(join_strokes(vec![a, b], 0.0).len(), 2);
    }
}
