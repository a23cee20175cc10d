//! Grayscale raster input
//!
//! Every extraction starts from an 8-bit grayscale grid. Colour images are
//! converted on load.

use crate::error::{CamToolError, CamToolResult};
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Immutable grayscale image owned by one extraction
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: GrayImage,
}

impl RasterImage {
    /// Wrap an existing grayscale buffer
    pub fn from_luma(pixels: GrayImage) -> CamToolResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(CamToolError::InvalidImage(format!(
                "image is {}x{}",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    /// Convert any decoded image to grayscale
    pub fn from_dynamic(image: DynamicImage) -> CamToolResult<Self> {
        Self::from_luma(image.to_luma8())
    }

    /// Decode an image file
    pub fn open<P: AsRef<Path>>(path: P) -> CamToolResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| CamToolError::InvalidImage(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Self::from_dynamic(image)
    }

    /// Decode an in-memory encoded image
    pub fn from_bytes(bytes: &[u8]) -> CamToolResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CamToolError::InvalidImage(e.to_string()))?;
        Self::from_dynamic(image)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the pixel buffer
    pub fn as_luma(&self) -> &GrayImage {
        &self.pixels
    }
}

/// Decode an image file into a grayscale raster
pub fn load_raster<P: AsRef<Path>>(path: P) -> CamToolResult<RasterImage> {
    RasterImage::open(path)
}
