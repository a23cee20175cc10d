//! Foreground mask construction
//!
//! Turns the grayscale raster into a binary ink mask (dark ink is
//! foreground) using one of the [`MaskMode`] strategies.

use super::params::{ExtractorParams, MaskMode};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::{contrast, edges, filter, morphology};

const INK: u8 = 255;

/// Binary pixel grid used by the thinning and tracing stages
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Any non-zero pixel is foreground
    pub(crate) fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|p| p[0] > 0).collect(),
        }
    }

    pub(crate) fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x as i64, y as i64) {
                Luma([INK])
            } else {
                Luma([0])
            }
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-range coordinates read as background
    pub(crate) fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = value;
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }
}

/// Build the ink mask for `image` according to `params`
pub(crate) fn build_mask(image: &GrayImage, params: &ExtractorParams) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if min >= max {
        tracing::debug!("Uniform raster, mask is empty");
        return GrayImage::new(image.width(), image.height());
    }

    let mut mask = match params.mask_mode {
        MaskMode::Edges => edges::canny(
            image,
            params.edge_low_threshold,
            params.edge_high_threshold,
        ),
        MaskMode::Otsu => {
            let level = contrast::otsu_level(image);
            tracing::debug!("Otsu level {}", level);
            threshold_below(image, |p| p <= level)
        }
        MaskMode::Fixed(level) => threshold_below(image, |p| p < level),
        MaskMode::Adaptive {
            block_radius,
            offset,
        } => adaptive(image, block_radius, offset),
    };

    if params.denoise && params.mask_mode != MaskMode::Edges {
        mask = morphology::close(&mask, Norm::LInf, 1);
        mask = morphology::open(&mask, Norm::LInf, 1);
    }

    if params.dilation_iterations > 0 {
        mask = morphology::dilate(&mask, Norm::LInf, params.dilation_iterations);
    }

    mask
}

fn threshold_below(image: &GrayImage, is_ink: impl Fn(u8) -> bool) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if is_ink(image.get_pixel(x, y)[0]) {
            Luma([INK])
        } else {
            Luma([0])
        }
    })
}

fn adaptive(image: &GrayImage, block_radius: u32, offset: u8) -> GrayImage {
    let blurred: GrayImage = filter::gaussian_blur_f32(image, 1.0);
    let local_mean = filter::box_filter(&blurred, block_radius, block_radius);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = blurred.get_pixel(x, y)[0] as i16;
        let mean = local_mean.get_pixel(x, y)[0] as i16;
        if pixel <= mean - offset as i16 {
            Luma([INK])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(40, 20, Luma([255]));
        for y in 8..12 {
            for x in 5..35 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        img
    }

    #[test]
    fn test_uniform_image_gives_empty_mask() {
        let img = GrayImage::from_pixel(10, 10, Luma([0]));
        let mask = build_mask(&img, &ExtractorParams::default());
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_fixed_threshold_marks_dark_pixels() {
        let params = ExtractorParams::default()
            .with_mask_mode(MaskMode::Fixed(128))
            .with_denoise(false);
        let mask = BinaryMask::from_gray(&build_mask(&bar_image(), &params));
        assert_eq!(mask.count(), 30 * 4);
        assert!(mask.get(10, 9));
        assert!(!mask.get(10, 2));
    }

    #[test]
    fn test_otsu_separates_bar() {
        let params = ExtractorParams::default().with_mask_mode(MaskMode::Otsu);
        let mask = BinaryMask::from_gray(&build_mask(&bar_image(), &params));
        assert!(mask.get(20, 10));
        assert!(!mask.get(20, 0));
    }

    #[test]
    fn test_edges_trace_bar_border() {
        let params = ExtractorParams::default().with_mask_mode(MaskMode::Edges);
        let mask = BinaryMask::from_gray(&build_mask(&bar_image(), &params));
        assert!(mask.count() > 0);
        assert!(!mask.get(20, 0));
    }

    #[test]
    fn test_binary_mask_bounds() {
        let mut mask = BinaryMask::new(3, 3);
        mask.set(1, 1, true);
        assert!(mask.get(1, 1));
        assert!(!mask.get(-1, 0));
        assert!(!mask.get(3, 1));
        assert_eq!(mask.to_gray().get_pixel(1, 1)[0], 255);
    }
}
