//! Calibration Mapper
//!
//! Places image-space strokes into the taught drawing area: rotate when the
//! image and the area disagree on orientation, scale to fill the area, center,
//! and drop whatever falls outside.

use crate::stroke::{OrientedStroke, Stroke};
use penarm_core::{DrawingArea, Point};
use serde::{Deserialize, Serialize};

/// Image to machine transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Points are turned 90 degrees clockwise before scaling
    pub rotated: bool,
    /// Millimetres per pixel
    pub scale: f64,
    /// Machine X of image X = 0
    pub offset_x: f64,
    /// Machine Y of image Y = 0
    pub offset_y: f64,
    /// Image width in pixels, before rotation
    pub image_width: f64,
    /// Image height in pixels, before rotation
    pub image_height: f64,
}

impl Placement {
    /// Map an image point to machine coordinates
    pub fn apply(&self, p: Point) -> Point {
        let (x, y) = if self.rotated {
            (self.image_height - p.y, p.x)
        } else {
            (p.x, p.y)
        };
        Point::new(x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}

/// Strokes in machine coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStrokes {
    /// In-bounds runs, in drawing order
    pub strokes: Vec<OrientedStroke>,
    /// Whether the image was rotated to match the area
    pub rotated: bool,
    /// Transform that was applied
    pub placement: Placement,
    /// Points dropped for falling outside the area
    pub clipped_points: usize,
}

/// Maps image strokes onto a [`DrawingArea`]
#[derive(Debug, Default)]
pub struct CalibrationMapper;

impl CalibrationMapper {
    /// Transform that fills `area` with an image of the given size
    ///
    /// The larger of the two axis scales is used, so the area is covered
    /// completely and the overflowing axis is cropped evenly on both sides.
    pub fn placement(image_width: u32, image_height: u32, area: &DrawingArea) -> Placement {
        let image_portrait = image_height > image_width;
        let rotated = image_portrait != area.is_portrait();

        let (w, h) = if rotated {
            (image_height as f64, image_width as f64)
        } else {
            (image_width as f64, image_height as f64)
        };
        let scale = (area.width() / w).max(area.height() / h);

        Placement {
            rotated,
            scale,
            offset_x: area.x_min + (area.width() - w * scale) / 2.0,
            offset_y: area.y_min + (area.height() - h * scale) / 2.0,
            image_width: image_width as f64,
            image_height: image_height as f64,
        }
    }

    /// Map oriented image strokes into machine coordinates
    ///
    /// Points outside the area are dropped, splitting a stroke into its
    /// in-bounds runs. Runs that no longer span a distance are discarded.
    pub fn map_to_machine(
        strokes: &[OrientedStroke],
        image_width: u32,
        image_height: u32,
        area: &DrawingArea,
    ) -> MappedStrokes {
        let placement = Self::placement(image_width, image_height, area);
        let mut mapped = Vec::with_capacity(strokes.len());
        let mut clipped_points = 0;

        for oriented in strokes {
            let source = oriented.stroke();
            let clipped_before = clipped_points;
            let mut runs: Vec<Vec<Point>> = vec![Vec::new()];
            for p in source.points() {
                let m = placement.apply(*p);
                if area.contains(&m) {
                    if let Some(run) = runs.last_mut() {
                        run.push(m);
                    }
                } else {
                    clipped_points += 1;
                    if runs.last().is_some_and(|run| !run.is_empty()) {
                        runs.push(Vec::new());
                    }
                }
            }

            let whole = clipped_points == clipped_before;
            for run in runs {
                let Some(stroke) = Stroke::new(run) else {
                    continue;
                };
                let stroke = stroke.with_closed(whole && source.is_closed());
                let stroke = match source.thickness_estimate() {
                    Some(t) => stroke.with_thickness(t * placement.scale),
                    None => stroke,
                };
                mapped.push(OrientedStroke::from_traversal(stroke, oriented.direction()));
            }
        }

        if clipped_points > 0 {
            tracing::debug!("Clipped {} points outside the drawing area", clipped_points);
        }

        MappedStrokes {
            strokes: mapped,
            rotated: placement.rotated,
            placement,
            clipped_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Direction;

    fn area(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> DrawingArea {
        DrawingArea::new(x_min, y_min, x_max, y_max, 0.0).unwrap()
    }

    fn oriented(raw: &[(f64, f64)]) -> OrientedStroke {
        let stroke = Stroke::new(raw.iter().map(|&p| p.into()).collect()).unwrap();
        OrientedStroke::new(stroke, Direction::Forward)
    }

    #[test]
    fn test_square_fill() {
        let placement = CalibrationMapper::placement(100, 100, &area(0.0, 0.0, 200.0, 200.0));
        assert!(!placement.rotated);
        assert_eq!(placement.scale, 2.0);
        assert_eq!(placement.apply(Point::new(50.0, 50.0)), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_fill_crops_the_longer_axis() {
        // 200x100 image into a 100x100 area: scale 1, x overflows by 100
        let placement = CalibrationMapper::placement(200, 100, &area(0.0, 0.0, 100.0, 100.0));
        assert_eq!(placement.scale, 1.0);
        assert_eq!(placement.offset_x, -50.0);
        assert_eq!(placement.offset_y, 0.0);
    }

    #[test]
    fn test_rotates_portrait_into_landscape() {
        let target = area(100.0, -50.0, 300.0, 50.0);
        let placement = CalibrationMapper::placement(50, 100, &target);
        assert!(placement.rotated);
        assert_eq!(placement.scale, 2.0);
        // image top-left lands on the area's top-right
        assert_eq!(placement.apply(Point::new(0.0, 0.0)), Point::new(300.0, -50.0));
        assert_eq!(placement.apply(Point::new(50.0, 100.0)), Point::new(100.0, 50.0));
    }

    #[test]
    fn test_clipping_splits_runs() {
        let target = area(0.0, 0.0, 100.0, 100.0);
        // 200x100 image: x in [50, 150] stays inside
        let stroke = oriented(&[
            (10.0, 10.0),
            (60.0, 10.0),
            (100.0, 10.0),
            (160.0, 10.0),
            (140.0, 20.0),
            (120.0, 20.0),
        ]);
        let mapped = CalibrationMapper::map_to_machine(&[stroke], 200, 100, &target);
        assert_eq!(mapped.clipped_points, 2);
        assert_eq!(mapped.strokes.len(), 2);
        assert_eq!(mapped.strokes[0].start(), Point::new(10.0, 10.0));
        assert_eq!(mapped.strokes[1].end(), Point::new(70.0, 20.0));
        for s in &mapped.strokes {
            for p in s.points() {
                assert!(target.contains(p));
            }
        }
    }

    #[test]
    fn test_fully_clipped_stroke_disappears() {
        let target = area(0.0, 0.0, 100.0, 100.0);
        let stroke = oriented(&[(0.0, 10.0), (20.0, 10.0)]);
        let mapped = CalibrationMapper::map_to_machine(&[stroke], 200, 100, &target);
        assert!(mapped.strokes.is_empty());
        assert_eq!(mapped.clipped_points, 2);
    }

    #[test]
    fn test_keeps_direction() {
        let stroke = Stroke::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]).unwrap();
        let reversed = OrientedStroke::new(stroke, Direction::Reversed);
        let mapped =
            CalibrationMapper::map_to_machine(&[reversed], 10, 10, &area(0.0, 0.0, 10.0, 10.0));
        assert_eq!(mapped.strokes[0].direction(), Direction::Reversed);
        assert_eq!(mapped.strokes[0].start(), Point::new(10.0, 0.0));
    }
}
