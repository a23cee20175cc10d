//! Zhang-Suen thinning
//!
//! Reduces the ink mask to one-pixel-wide centerlines so a thick line is
//! traced once along its middle instead of once per side.

use super::mask::BinaryMask;
use imageproc::filter;

/// Offsets of P2..P9 in clockwise order starting north
const RING: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Thin `mask` to a one-pixel-wide skeleton
pub(crate) fn thin(mask: &BinaryMask) -> BinaryMask {
    let mut skeleton = mask.clone();
    let mut doomed: Vec<(u32, u32)> = Vec::new();

    loop {
        let mut changed = false;
        for pass in 0..2 {
            doomed.clear();
            for y in 0..skeleton.height() {
                for x in 0..skeleton.width() {
                    if skeleton.get(x as i64, y as i64) && removable(&skeleton, x, y, pass) {
                        doomed.push((x, y));
                    }
                }
            }
            for &(x, y) in &doomed {
                skeleton.set(x, y, false);
            }
            changed |= !doomed.is_empty();
        }
        if !changed {
            break;
        }
    }

    skeleton
}

/// Blur the skeleton, binarize at half intensity, and thin again
pub(crate) fn smooth(skeleton: &BinaryMask, sigma: f32) -> BinaryMask {
    if sigma.is_nan() || sigma <= 0.0 {
        return skeleton.clone();
    }
    let blurred = filter::gaussian_blur_f32(&skeleton.to_gray(), sigma);
    let mut binary = BinaryMask::new(skeleton.width(), skeleton.height());
    for (x, y, pixel) in blurred.enumerate_pixels() {
        if pixel[0] > 127 {
            binary.set(x, y, true);
        }
    }
    thin(&binary)
}

fn removable(mask: &BinaryMask, x: u32, y: u32, pass: usize) -> bool {
    let ring: [bool; 8] = RING.map(|(dx, dy)| mask.get(x as i64 + dx, y as i64 + dy));

    let neighbours = ring.iter().filter(|v| **v).count();
    if !(2..=6).contains(&neighbours) {
        return false;
    }

    let transitions = (0..8).filter(|&i| !ring[i] && ring[(i + 1) % 8]).count();
    if transitions != 1 {
        return false;
    }

    // ring[0]=P2 (N), ring[2]=P4 (E), ring[4]=P6 (S), ring[6]=P8 (W)
    let (p2, p4, p6, p8) = (ring[0], ring[2], ring[4], ring[6]);
    if pass == 0 {
        !(p2 && p4 && p6) && !(p4 && p6 && p8)
    } else {
        !(p2 && p4 && p8) && !(p2 && p6 && p8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> BinaryMask {
        let mut mask = BinaryMask::new(width, height);
        for y in y0..y1 {
            for x in x0..x1 {
                mask.set(x, y, true);
            }
        }
        mask
    }

    #[test]
    fn test_thick_bar_thins_to_line() {
        let bar = filled(60, 20, 10, 7, 50, 13);
        let skeleton = thin(&bar);

        let count = skeleton.count();
        assert!((20..=60).contains(&count), "skeleton has {count} pixels");
        for x in 20..40 {
            let column = (0..20).filter(|&y| skeleton.get(x, y)).count();
            assert_eq!(column, 1, "column {x} holds {column} pixels");
        }
    }

    #[test]
    fn test_thin_line_is_stable() {
        let line = filled(20, 5, 2, 2, 18, 3);
        assert_eq!(thin(&line), line);
    }

    #[test]
    fn test_empty_mask() {
        let mask = BinaryMask::new(8, 8);
        assert_eq!(thin(&mask).count(), 0);
    }

    #[test]
    fn test_smoothing_keeps_lines() {
        let line = filled(30, 9, 3, 4, 27, 5);
        let smoothed = smooth(&line, 0.5);
        assert!(smoothed.count() >= 20);

        assert_eq!(smooth(&line, 0.0), line);
    }
}
