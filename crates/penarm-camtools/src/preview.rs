//! Stroke preview rendering
//!
//! Draws extracted strokes onto a white canvas so presets can be compared by
//! eye before anything is sent to the arm.

use crate::stroke::Stroke;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

const INK: Rgb<u8> = Rgb([0, 0, 0]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

/// Render `strokes` in image coordinates on a `width` x `height` canvas
pub fn render_preview(strokes: &[Stroke], width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, PAPER);
    for stroke in strokes {
        for pair in stroke.points().windows(2) {
            draw_line_segment_mut(
                &mut canvas,
                (pair[0].x as f32, pair[0].y as f32),
                (pair[1].x as f32, pair[1].y as f32),
                INK,
            );
        }
    }
    canvas
}
