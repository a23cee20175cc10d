//! Extraction parameters

use crate::error::{CamToolResult, ParameterError};
use serde::{Deserialize, Serialize};

/// How the binary foreground mask is obtained from the raster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Canny edges between the low and high thresholds
    Edges,
    /// Global threshold chosen by Otsu's method
    Otsu,
    /// Global threshold at a fixed level; darker pixels are ink
    Fixed(u8),
    /// Pixels darker than their neighbourhood mean minus `offset`
    Adaptive {
        /// Half-size of the square neighbourhood
        block_radius: u32,
        /// Margin below the local mean
        offset: u8,
    },
}

/// How regions too thick for a centerline are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    /// 45 degree hatch lines
    Diagonal,
    /// Horizontal serpentine scanlines
    Zigzag,
}

/// Tunable knobs of the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorParams {
    /// Mask construction
    pub mask_mode: MaskMode,
    /// Canny low threshold
    pub edge_low_threshold: f32,
    /// Canny high threshold
    pub edge_high_threshold: f32,
    /// Dilation passes (3x3) applied to the mask before thinning
    pub dilation_iterations: u8,
    /// Morphological close then open on threshold masks
    pub denoise: bool,
    /// Gaussian sigma applied to the skeleton before tracing, 0 disables
    pub skeleton_smooth_sigma: f32,
    /// Douglas-Peucker tolerance in pixels
    pub simplify_epsilon: f64,
    /// Traced paths with fewer points are dropped
    pub min_segment_length: usize,
    /// Endpoints closer than this are joined, 0 disables
    pub join_threshold: f64,
    /// Mean half-width above which a region is filled instead of traced
    pub thick_area_fill_threshold: Option<f64>,
    /// Fill pattern for thick regions
    pub fill_style: FillStyle,
    /// Distance between fill lines in pixels
    pub fill_spacing: u32,
    /// Gaussian sigma applied to joined strokes, 0 disables
    pub smooth_sigma: f64,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            mask_mode: MaskMode::Adaptive {
                block_radius: 10,
                offset: 5,
            },
            edge_low_threshold: 50.0,
            edge_high_threshold: 150.0,
            dilation_iterations: 0,
            denoise: true,
            skeleton_smooth_sigma: 0.5,
            simplify_epsilon: 0.5,
            min_segment_length: 3,
            join_threshold: 0.0,
            thick_area_fill_threshold: None,
            fill_style: FillStyle::Diagonal,
            fill_spacing: 4,
            smooth_sigma: 0.0,
        }
    }
}

impl ExtractorParams {
    /// Parameters of a named preset
    pub fn preset(name: &str) -> Option<Self> {
        name.parse::<super::ExtractionPreset>()
            .ok()
            .map(|preset| preset.params())
    }

    /// Set the mask mode
    pub fn with_mask_mode(mut self, mode: MaskMode) -> Self {
        self.mask_mode = mode;
        self
    }

    /// Set the Canny thresholds
    pub fn with_edge_thresholds(mut self, low: f32, high: f32) -> Self {
        self.edge_low_threshold = low;
        self.edge_high_threshold = high;
        self
    }

    /// Set the number of dilation passes
    pub fn with_dilation(mut self, iterations: u8) -> Self {
        self.dilation_iterations = iterations;
        self
    }

    /// Enable or disable mask denoising
    pub fn with_denoise(mut self, denoise: bool) -> Self {
        self.denoise = denoise;
        self
    }

    /// Set the skeleton smoothing sigma
    pub fn with_skeleton_smoothing(mut self, sigma: f32) -> Self {
        self.skeleton_smooth_sigma = sigma;
        self
    }

    /// Set the simplification tolerance
    pub fn with_simplify_epsilon(mut self, epsilon: f64) -> Self {
        self.simplify_epsilon = epsilon;
        self
    }

    /// Set the minimum traced path length
    pub fn with_min_segment_length(mut self, points: usize) -> Self {
        self.min_segment_length = points;
        self
    }

    /// Set the endpoint join distance
    pub fn with_join_threshold(mut self, threshold: f64) -> Self {
        self.join_threshold = threshold;
        self
    }

    /// Fill regions thicker than `threshold` with the given style
    pub fn with_fill(mut self, threshold: f64, style: FillStyle, spacing: u32) -> Self {
        self.thick_area_fill_threshold = Some(threshold);
        self.fill_style = style;
        self.fill_spacing = spacing;
        self
    }

    /// Set the output smoothing sigma
    pub fn with_smoothing(mut self, sigma: f64) -> Self {
        self.smooth_sigma = sigma;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> CamToolResult<()> {
        if !non_negative(self.edge_low_threshold as f64) {
            return Err(invalid("edge_low_threshold", "must be a non-negative number"));
        }
        if !non_negative((self.edge_high_threshold - self.edge_low_threshold) as f64) {
            return Err(invalid(
                "edge_high_threshold",
                "must not be below the low threshold",
            ));
        }
        if !non_negative(self.skeleton_smooth_sigma as f64) {
            return Err(invalid("skeleton_smooth_sigma", "must be a non-negative number"));
        }
        if !non_negative(self.simplify_epsilon) {
            return Err(invalid("simplify_epsilon", "must be a non-negative number"));
        }
        if !non_negative(self.join_threshold) {
            return Err(invalid("join_threshold", "must be a non-negative number"));
        }
        if !non_negative(self.smooth_sigma) {
            return Err(invalid("smooth_sigma", "must be a non-negative number"));
        }
        if let Some(threshold) = self.thick_area_fill_threshold {
            if !non_negative(threshold) || threshold == 0.0 {
                return Err(invalid("thick_area_fill_threshold", "must be positive"));
            }
        }
        if self.fill_spacing == 0 || self.fill_spacing > 64 {
            return Err(ParameterError::OutOfRange {
                name: "fill_spacing".to_string(),
                value: self.fill_spacing as f64,
                min: 1.0,
                max: 64.0,
            }
            .into());
        }
        if let MaskMode::Adaptive { block_radius, .. } = self.mask_mode {
            if block_radius == 0 {
                return Err(invalid("block_radius", "must be at least 1"));
            }
        }
        Ok(())
    }
}

fn non_negative(value: f64) -> bool {
    value >= 0.0
}

fn invalid(name: &str, reason: &str) -> crate::error::CamToolError {
    ParameterError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ExtractorParams::default().validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let params = ExtractorParams::default()
            .with_mask_mode(MaskMode::Fixed(128))
            .with_join_threshold(8.0)
            .with_fill(12.0, FillStyle::Zigzag, 5)
            .with_smoothing(1.0);
        assert_eq!(params.mask_mode, MaskMode::Fixed(128));
        assert_eq!(params.join_threshold, 8.0);
        assert_eq!(params.thick_area_fill_threshold, Some(12.0));
        assert_eq!(params.fill_style, FillStyle::Zigzag);
        assert_eq!(params.fill_spacing, 5);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let params = ExtractorParams::default().with_edge_thresholds(100.0, 50.0);
        assert!(params.validate().is_err());

        let params = ExtractorParams::default().with_join_threshold(f64::NAN);
        assert!(params.validate().is_err());

        let params = ExtractorParams::default().with_fill(10.0, FillStyle::Diagonal, 0);
        assert!(params.validate().is_err());

        let params = ExtractorParams::default().with_mask_mode(MaskMode::Adaptive {
            block_radius: 0,
            offset: 5,
        });
        assert!(params.validate().is_err());
    }
}
