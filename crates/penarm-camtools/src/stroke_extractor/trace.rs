//! Skeleton tracing
//!
//! Walks the one-pixel skeleton into ordered pixel paths. Branches meeting at
//! a junction share the junction pixel so the drawn result stays connected.

use super::mask::BinaryMask;
use penarm_core::Point;

/// Orthogonal neighbours first so walks prefer straight steps
const NEIGHBOURS: [(i64, i64); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// A pixel path through the skeleton
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TracedPath {
    pub(crate) pixels: Vec<(i64, i64)>,
    pub(crate) closed: bool,
}

impl TracedPath {
    pub(crate) fn points(&self) -> Vec<Point> {
        self.pixels
            .iter()
            .map(|&(x, y)| Point::new(x as f64, y as f64))
            .collect()
    }
}

/// Trace every skeleton pixel into paths, starting from line ends
pub(crate) fn trace(skeleton: &BinaryMask) -> Vec<TracedPath> {
    let mut visited = BinaryMask::new(skeleton.width(), skeleton.height());
    let mut paths = Vec::new();

    for endpoints_only in [true, false] {
        for y in 0..skeleton.height() as i64 {
            for x in 0..skeleton.width() as i64 {
                if !skeleton.get(x, y) || visited.get(x, y) {
                    continue;
                }
                if endpoints_only && degree(skeleton, x, y) != 1 {
                    continue;
                }
                paths.push(walk(skeleton, &mut visited, (x, y)));
            }
        }
    }

    paths
}

fn degree(skeleton: &BinaryMask, x: i64, y: i64) -> usize {
    NEIGHBOURS
        .iter()
        .filter(|(dx, dy)| skeleton.get(x + dx, y + dy))
        .count()
}

fn walk(skeleton: &BinaryMask, visited: &mut BinaryMask, start: (i64, i64)) -> TracedPath {
    let mut pixels = vec![start];
    visited.set(start.0 as u32, start.1 as u32, true);

    let mut current = start;
    while let Some(next) = NEIGHBOURS
        .iter()
        .map(|(dx, dy)| (current.0 + dx, current.1 + dy))
        .find(|&(x, y)| skeleton.get(x, y) && !visited.get(x, y))
    {
        visited.set(next.0 as u32, next.1 as u32, true);
        pixels.push(next);
        current = next;
    }

    let mut closed = false;
    let tail_window = pixels.len().saturating_sub(3);
    if let Some(link) = visited_neighbour(skeleton, visited, current, &pixels[tail_window..]) {
        closed = link == start && pixels.len() > 2;
        pixels.push(link);
    }

    if !closed {
        let head_window = pixels.len().min(3);
        if let Some(link) = visited_neighbour(skeleton, visited, start, &pixels[..head_window]) {
            pixels.insert(0, link);
        }
    }

    TracedPath { pixels, closed }
}

/// A neighbour traced earlier that is not part of `exclude`
fn visited_neighbour(
    skeleton: &BinaryMask,
    visited: &BinaryMask,
    at: (i64, i64),
    exclude: &[(i64, i64)],
) -> Option<(i64, i64)> {
    NEIGHBOURS
        .iter()
        .map(|(dx, dy)| (at.0 + dx, at.1 + dy))
        .find(|&(x, y)| skeleton.get(x, y) && visited.get(x, y) && !exclude.contains(&(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> BinaryMask {
        let mut mask = BinaryMask::new(rows[0].len() as u32, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    mask.set(x as u32, y as u32, true);
                }
            }
        }
        mask
    }

    #[test]
    fn test_straight_line_from_endpoint() {
        let mask = mask_from(&["......", ".####.", "......"]);
        let paths = trace(&mask);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].pixels, vec![(1, 1), (2, 1), (3, 1), (4, 1)]);
        assert!(!paths[0].closed);
    }

    #[test]
    fn test_ring_is_closed() {
        let mask = mask_from(&[".....", ".###.", ".#.#.", ".###.", "....."]);
        let paths = trace(&mask);
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert!(path.closed);
        assert_eq!(path.pixels.first(), path.pixels.last());
        assert_eq!(path.pixels.len(), 9);
    }

    #[test]
    fn test_branch_shares_junction() {
        let mask = mask_from(&[
            ".......", //
            ".#####.", //
            "...#...", //
            "...#...", //
            ".......",
        ]);
        let paths = trace(&mask);
        assert_eq!(paths.len(), 2);
        let total: usize = paths.iter().map(|p| p.pixels.len()).sum();
        // seven skeleton pixels plus one shared junction
        assert_eq!(total, 8);
    }

    #[test]
    fn test_every_pixel_is_covered() {
        let mask = mask_from(&["#..#", ".##.", "#..#"]);
        let paths = trace(&mask);
        let mut seen: Vec<(i64, i64)> = paths.iter().flat_map(|p| p.pixels.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), mask.count());
    }
}
