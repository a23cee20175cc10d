//! Thickness measurement and area fills
//!
//! Regions too wide for a single centerline are hatched instead: either with
//! 45 degree lines or with one serpentine scanline stroke per region.

use super::mask::BinaryMask;
use super::params::FillStyle;
use crate::polyline;
use crate::stroke::Stroke;
use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::region_labelling::{connected_components, Connectivity};
use penarm_core::Point;
use std::collections::BTreeSet;

/// Minimum pixels a diagonal hatch run needs to be kept
const MIN_HATCH_RUN: usize = 4;

/// Distance from every ink pixel to the nearest background pixel
pub(crate) struct DistanceMap {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl DistanceMap {
    pub(crate) fn new(mask: &GrayImage) -> Self {
        let background = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            if mask.get_pixel(x, y)[0] > 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let squared = euclidean_squared_distance_transform(&background);
        Self {
            width: mask.width(),
            height: mask.height(),
            values: squared.pixels().map(|p| p[0].sqrt()).collect(),
        }
    }

    pub(crate) fn at(&self, x: i64, y: i64) -> Option<f64> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.values[y as usize * self.width as usize + x as usize])
    }

    /// Mean half-width along a pixel path, sampled at about ten points
    pub(crate) fn mean_half_width(&self, pixels: &[(i64, i64)]) -> f64 {
        let step = (pixels.len() / 10).max(1);
        let samples: Vec<f64> = pixels
            .iter()
            .step_by(step)
            .filter_map(|&(x, y)| self.at(x, y))
            .collect();
        if samples.is_empty() {
            return 0.0;
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let limit = self.width.max(self.height) as f64;
        // an image without background reports unbounded distances
        if mean.is_finite() && mean <= limit {
            mean
        } else {
            limit
        }
    }
}

/// Connected ink regions of the mask
pub(crate) struct Regions {
    labels: image::ImageBuffer<Luma<u32>, Vec<u32>>,
}

impl Regions {
    pub(crate) fn new(mask: &GrayImage) -> Self {
        Self {
            labels: connected_components(mask, Connectivity::Eight, Luma([0u8])),
        }
    }

    /// Labels of the regions the path runs through
    pub(crate) fn labels_under(&self, pixels: &[(i64, i64)]) -> BTreeSet<u32> {
        pixels
            .iter()
            .filter(|&&(x, y)| {
                x >= 0 && y >= 0 && (x as u32) < self.labels.width() && (y as u32) < self.labels.height()
            })
            .map(|&(x, y)| self.labels.get_pixel(x as u32, y as u32)[0])
            .filter(|label| *label != 0)
            .collect()
    }

    /// Mask of a single region
    pub(crate) fn region(&self, label: u32) -> BinaryMask {
        let mut mask = BinaryMask::new(self.labels.width(), self.labels.height());
        for (x, y, pixel) in self.labels.enumerate_pixels() {
            if pixel[0] == label {
                mask.set(x, y, true);
            }
        }
        mask
    }
}

/// Fill strokes covering `region`
pub(crate) fn fill_region(region: &BinaryMask, style: FillStyle, spacing: u32) -> Vec<Stroke> {
    let Some(bounds) = Bounds::of(region) else {
        return Vec::new();
    };
    match style {
        FillStyle::Diagonal => diagonal(region, &bounds, spacing.max(1) as i64),
        FillStyle::Zigzag => zigzag(region, &bounds, spacing.max(1) as i64),
    }
}

struct Bounds {
    x_min: i64,
    y_min: i64,
    x_max: i64,
    y_max: i64,
}

impl Bounds {
    fn of(mask: &BinaryMask) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for y in 0..mask.height() as i64 {
            for x in 0..mask.width() as i64 {
                if !mask.get(x, y) {
                    continue;
                }
                let b = bounds.get_or_insert(Self {
                    x_min: x,
                    y_min: y,
                    x_max: x,
                    y_max: y,
                });
                b.x_min = b.x_min.min(x);
                b.x_max = b.x_max.max(x);
                b.y_max = b.y_max.max(y);
            }
        }
        bounds
    }
}

fn point(x: i64, y: i64) -> Point {
    Point::new(x as f64, y as f64)
}

/// Hatch lines running down-right, one stroke per unbroken run
fn diagonal(region: &BinaryMask, bounds: &Bounds, spacing: i64) -> Vec<Stroke> {
    let mut strokes = Vec::new();
    let mut offset = bounds.y_min - bounds.x_max;

    while offset <= bounds.y_max - bounds.x_min {
        let mut run: Vec<(i64, i64)> = Vec::new();
        for x in bounds.x_min..=bounds.x_max + 1 {
            let y = x + offset;
            if region.get(x, y) {
                run.push((x, y));
                continue;
            }
            if run.len() >= MIN_HATCH_RUN {
                let (first, last) = (run[0], run[run.len() - 1]);
                strokes.extend(Stroke::new(vec![
                    point(first.0, first.1),
                    point(last.0, last.1),
                ]));
            }
            run.clear();
        }
        offset += spacing;
    }

    strokes
}

/// Horizontal scanlines joined end to end while the link stays inside the region
fn zigzag(region: &BinaryMask, bounds: &Bounds, spacing: i64) -> Vec<Stroke> {
    let mut strokes = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut left_to_right = true;
    let mut y = bounds.y_min + spacing;

    while y < bounds.y_max {
        let mut runs = scanline_runs(region, bounds, y);
        if !left_to_right {
            runs.reverse();
        }
        for (start, end) in runs {
            let (from, to) = if left_to_right {
                (point(start, y), point(end, y))
            } else {
                (point(end, y), point(start, y))
            };
            let linked = current
                .last()
                .is_some_and(|last| segment_inside(region, last, &from));
            if !linked {
                flush(&mut strokes, &mut current);
            }
            current.push(from);
            current.push(to);
        }
        left_to_right = !left_to_right;
        y += spacing;
    }
    flush(&mut strokes, &mut current);

    strokes
}

fn scanline_runs(region: &BinaryMask, bounds: &Bounds, y: i64) -> Vec<(i64, i64)> {
    let mut runs = Vec::new();
    let mut start: Option<i64> = None;
    for x in bounds.x_min..=bounds.x_max + 1 {
        match (region.get(x, y), start) {
            (true, None) => start = Some(x),
            (false, Some(s)) => {
                runs.push((s, x - 1));
                start = None;
            }
            _ => {}
        }
    }
    runs
}

fn segment_inside(region: &BinaryMask, a: &Point, b: &Point) -> bool {
    let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil() as i64;
    (0..=steps).all(|i| {
        let t = if steps == 0 { 0.0 } else { i as f64 / steps as f64 };
        let x = (a.x + t * (b.x - a.x)).round() as i64;
        let y = (a.y + t * (b.y - a.y)).round() as i64;
        region.get(x, y)
    })
}

fn flush(strokes: &mut Vec<Stroke>, current: &mut Vec<Point>) {
    if !current.is_empty() {
        strokes.extend(Stroke::new(polyline::dedup(current)));
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        let mut img = GrayImage::new(size, size);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    #[test]
    fn test_distance_map_center_of_square() {
        let mask = square(40, 10, 10, 20);
        let distances = DistanceMap::new(&mask);
        assert_eq!(distances.at(0, 0), Some(0.0));
        let center = distances.at(20, 20).unwrap();
        assert!((9.0..=11.0).contains(&center), "center distance {center}");
        assert_eq!(distances.at(-1, 0), None);
    }

    #[test]
    fn test_mean_half_width_of_centerline() {
        let mask = square(40, 10, 10, 20);
        let distances = DistanceMap::new(&mask);
        let centerline: Vec<(i64, i64)> = (12..28).map(|x| (x, 20)).collect();
        let mean = distances.mean_half_width(&centerline);
        assert!(mean > 2.0 && mean <= 11.0);
    }

    #[test]
    fn test_all_ink_image_uses_image_size() {
        let mask = GrayImage::from_pixel(8, 6, Luma([255]));
        let distances = DistanceMap::new(&mask);
        let mean = distances.mean_half_width(&[(3, 3), (4, 3)]);
        assert_eq!(mean, 8.0);
    }

    #[test]
    fn test_regions_by_label() {
        let mut mask = square(30, 2, 2, 5);
        for y in 20..25 {
            for x in 20..25 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let regions = Regions::new(&mask);
        let labels = regions.labels_under(&[(3, 3), (0, 0)]);
        assert_eq!(labels.len(), 1);
        let label = *labels.iter().next().unwrap();
        assert_eq!(regions.region(label).count(), 25);
    }

    #[test]
    fn test_diagonal_fill_stays_inside() {
        let region = BinaryMask::from_gray(&square(40, 5, 5, 20));
        let strokes = fill_region(&region, FillStyle::Diagonal, 4);
        assert!(!strokes.is_empty());
        for stroke in &strokes {
            assert_eq!(stroke.len(), 2);
            let (a, b) = (stroke.start(), stroke.end());
            assert_eq!(b.x - a.x, b.y - a.y);
            assert!(b.x - a.x >= 3.0);
            assert!(region.get(a.x as i64, a.y as i64) && region.get(b.x as i64, b.y as i64));
        }
    }

    #[test]
    fn test_zigzag_fill_is_one_serpentine() {
        let region = BinaryMask::from_gray(&square(40, 5, 5, 20));
        let strokes = fill_region(&region, FillStyle::Zigzag, 5);
        assert_eq!(strokes.len(), 1);
        let points = strokes[0].points();
        // scanlines at y = 10, 15, 20
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], Point::new(5.0, 10.0));
        assert_eq!(points[1], Point::new(24.0, 10.0));
        assert_eq!(points[2], Point::new(24.0, 15.0));
    }

    #[test]
    fn test_empty_region() {
        let region = BinaryMask::new(10, 10);
        assert!(fill_region(&region, FillStyle::Zigzag, 5).is_empty());
    }
}
