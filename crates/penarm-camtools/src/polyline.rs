//! Polyline helpers: length, simplification and smoothing

use penarm_core::Point;

/// Total length of a polyline
pub fn length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Drop consecutive duplicate points
pub fn dedup(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() != Some(p) {
            out.push(*p);
        }
    }
    out
}

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Douglas-Peucker simplification
///
/// Keeps the end points and every point farther than `epsilon` from the
/// chord of its span. A non-positive epsilon only removes duplicates.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    let points = dedup(points);
    if points.len() < 3 || epsilon <= 0.0 {
        return points;
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut index = first;
        for i in first + 1..last {
            let d = segment_distance(&points[i], &points[first], &points[last]);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        if max_dist > epsilon {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Normalized 1-D Gaussian kernel truncated at four sigmas
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Gaussian low-pass over the x and y series independently
///
/// Open paths repeat their edge samples past the ends, so the end points
/// stay close to where they were. Closed paths (first point equal to the
/// last) wrap around and stay closed.
pub fn gaussian_smooth(points: &[Point], sigma: f64) -> Vec<Point> {
    if sigma.is_nan() || sigma <= 0.0 || points.len() <= 2 {
        return points.to_vec();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let closed = points.len() > 3 && points[0] == points[points.len() - 1];
    let series = if closed {
        &points[..points.len() - 1]
    } else {
        points
    };
    let n = series.len() as isize;

    let mut out: Vec<Point> = (0..n)
        .map(|i| {
            let mut x = 0.0;
            let mut y = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let j = i + k as isize - radius;
                let j = if closed {
                    j.rem_euclid(n)
                } else {
                    j.clamp(0, n - 1)
                };
                let p = series[j as usize];
                x += w * p.x;
                y += w * p.y;
            }
            Point::new(x, y)
        })
        .collect();

    if closed {
        out.push(out[0]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&p| p.into()).collect()
    }

    #[test]
    fn test_simplify_collinear() {
        let line: Vec<Point> = (0..=10).map(|i| Point::new(i as f64, 0.0)).collect();
        assert_eq!(simplify(&line, 0.5), pts(&[(0.0, 0.0), (10.0, 0.0)]));
    }

    #[test]
    fn test_simplify_keeps_corner() {
        let l_shape = pts(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (10.0, 5.0), (10.0, 10.0)]);
        assert_eq!(
            simplify(&l_shape, 0.5),
            pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])
        );
    }

    #[test]
    fn test_simplify_zero_epsilon_only_dedups() {
        let raw = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(simplify(&raw, 0.0), pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
    }

    #[test]
    fn test_simplify_within_tolerance() {
        let noisy = pts(&[(0.0, 0.0), (1.0, 0.3), (2.0, -0.3), (3.0, 0.2), (4.0, 0.0)]);
        assert_eq!(simplify(&noisy, 0.5).len(), 2);
        assert_eq!(simplify(&noisy, 0.1).len(), 5);
    }

    #[test]
    fn test_smooth_straight_line_is_stable() {
        let line: Vec<Point> = (0..20).map(|i| Point::new(i as f64, 3.0)).collect();
        let smooth = gaussian_smooth(&line, 1.5);
        assert_eq!(smooth.len(), line.len());
        for p in &smooth {
            assert!((p.y - 3.0).abs() < 1e-9);
        }
        // Interior points of a uniformly spaced line are unchanged.
        assert!((smooth[10].x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_smooth_reduces_zigzag() {
        let zigzag: Vec<Point> = (0..30)
            .map(|i| Point::new(i as f64, if i % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let smooth = gaussian_smooth(&zigzag, 1.0);
        for p in &smooth[3..27] {
            assert!((p.y - 0.5).abs() < 0.1, "y = {}", p.y);
        }
    }

    #[test]
    fn test_smooth_closed_stays_closed() {
        let square = pts(&[
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]);
        let smooth = gaussian_smooth(&square, 1.0);
        assert_eq!(smooth.len(), square.len());
        assert_eq!(smooth[0], smooth[smooth.len() - 1]);
    }

    #[test]
    fn test_smooth_short_or_disabled() {
        let two = pts(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(gaussian_smooth(&two, 2.0), two);
        let three = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        assert_eq!(gaussian_smooth(&three, 0.0), three);
    }

    #[test]
    fn test_length() {
        assert_eq!(length(&pts(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)])), 11.0);
        assert_eq!(length(&[]), 0.0);
    }
}
