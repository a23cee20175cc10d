//! Stroke Extractor
//!
//! Converts a grayscale raster into plotter-friendly pen strokes:
//!
//! 1. Build a binary ink mask (edges or thresholding), optionally dilated.
//! 2. Thin the mask to one-pixel centerlines, optionally smoothing them.
//! 3. Trace the centerlines into pixel paths, drop short ones, simplify, and
//!    push open ends back out to the ink boundary.
//! 4. Replace paths through very thick regions with area fills.
//! 5. Join fragments whose endpoints nearly touch.
//! 6. Smooth the joined strokes.
//!
//! Every stage is deterministic, so the same image and parameters always
//! give the same strokes.

mod fill;
mod join;
mod mask;
mod params;
mod presets;
mod skeleton;
mod trace;

pub use join::join_strokes;
pub use params::{ExtractorParams, FillStyle, MaskMode};
pub use presets::ExtractionPreset;

use crate::error::CamToolResult;
use crate::polyline;
use crate::raster::RasterImage;
use crate::stroke::Stroke;
use penarm_core::Point;
use fill::{DistanceMap, Regions};
use mask::BinaryMask;
use std::collections::BTreeSet;

/// Raster to stroke vectorizer
#[derive(Debug, Clone)]
pub struct StrokeExtractor {
    params: ExtractorParams,
}

impl StrokeExtractor {
    /// Create an extractor, rejecting out-of-range parameters
    pub fn new(params: ExtractorParams) -> CamToolResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Extractor for a named preset
    pub fn from_preset(preset: ExtractionPreset) -> Self {
        Self {
            params: preset.params(),
        }
    }

    /// Parameters in use
    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Extract strokes in image pixel coordinates
    ///
    /// A blank or uniform image yields no strokes.
    pub fn extract(&self, image: &RasterImage) -> Vec<Stroke> {
        let params = &self.params;
        let ink = mask::build_mask(image.as_luma(), params);

        let ink_mask = BinaryMask::from_gray(&ink);
        let mut skeleton = skeleton::thin(&ink_mask);
        if params.skeleton_smooth_sigma > 0.0 {
            skeleton = skeleton::smooth(&skeleton, params.skeleton_smooth_sigma);
        }

        let paths: Vec<_> = trace::trace(&skeleton)
            .into_iter()
            .filter(|path| path.pixels.len() >= params.min_segment_length)
            .collect();

        let distances = DistanceMap::new(&ink);
        let regions = params.thick_area_fill_threshold.map(|_| Regions::new(&ink));
        let mut thick_labels = BTreeSet::new();
        let mut outline = Vec::with_capacity(paths.len());

        for path in &paths {
            let half_width = distances.mean_half_width(&path.pixels);
            if let (Some(threshold), Some(regions)) = (params.thick_area_fill_threshold, &regions) {
                if half_width > threshold {
                    thick_labels.extend(regions.labels_under(&path.pixels));
                    continue;
                }
            }

            let mut points = polyline::simplify(&path.points(), params.simplify_epsilon);
            if !path.closed {
                extend_ends(&mut points, &ink_mask, &distances);
            }
            if let Some(stroke) = Stroke::new(points) {
                outline.push(
                    stroke
                        .with_closed(path.closed)
                        .with_thickness(2.0 * half_width),
                );
            }
        }

        let mut strokes = join_strokes(outline, params.join_threshold);

        if params.smooth_sigma > 0.0 {
            strokes = strokes
                .into_iter()
                .map(|stroke| {
                    let smoothed = polyline::gaussian_smooth(stroke.points(), params.smooth_sigma);
                    stroke.with_points(smoothed).unwrap_or(stroke)
                })
                .collect();
        }

        let outline_count = strokes.len();
        if let Some(regions) = &regions {
            for label in &thick_labels {
                strokes.extend(fill::fill_region(
                    &regions.region(*label),
                    params.fill_style,
                    params.fill_spacing,
                ));
            }
        }

        tracing::debug!(
            "Extracted {} strokes ({} traced paths, {} filled regions, {} fill strokes)",
            strokes.len(),
            paths.len(),
            thick_labels.len(),
            strokes.len() - outline_count
        );

        strokes
    }
}

/// Push the free ends of an open centerline back out to the ink boundary
///
/// Thinning eats roughly the local half-width off every free end, so each
/// end walks on along its last segment while it stays on ink. The walk is
/// bounded by twice the half-width at the end point.
fn extend_ends(points: &mut [Point], ink: &BinaryMask, distances: &DistanceMap) {
    let n = points.len();
    if n < 2 {
        return;
    }
    let head = extend_end(points[1], points[0], ink, distances);
    let tail = extend_end(points[n - 2], points[n - 1], ink, distances);
    points[0] = head;
    points[n - 1] = tail;
}

fn extend_end(from: Point, end: Point, ink: &BinaryMask, distances: &DistanceMap) -> Point {
    let len = from.distance_to(&end);
    if len == 0.0 {
        return end;
    }
    let (dx, dy) = ((end.x - from.x) / len, (end.y - from.y) / len);
    let limit = ink.width().max(ink.height()) as f64;
    let reach = distances
        .at(end.x.round() as i64, end.y.round() as i64)
        .unwrap_or(0.0)
        .min(limit);
    let steps = (2.0 * reach).ceil() as usize + 1;

    let mut tip = end;
    for i in 1..=steps {
        let p = Point::new(end.x + dx * i as f64, end.y + dy * i as f64);
        if !ink.get(p.x.round() as i64, p.y.round() as i64) {
            break;
        }
        tip = p;
    }
    tip
}

/// Extract strokes from `image` with `params`
pub fn extract(image: &RasterImage, params: &ExtractorParams) -> CamToolResult<Vec<Stroke>> {
    Ok(StrokeExtractor::new(params.clone())?.extract(image))
}
