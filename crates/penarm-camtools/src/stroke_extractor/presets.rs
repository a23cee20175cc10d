//! Named extraction presets
//!
//! Each preset is a complete [`ExtractorParams`]; choosing between centerline
//! tracing, joined outlines and area fills is a configuration choice.

use super::params::{ExtractorParams, FillStyle, MaskMode};
use crate::error::CamToolError;
use std::fmt;
use std::str::FromStr;

/// Built-in parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionPreset {
    /// Adaptive threshold, light skeleton smoothing
    CleanV1,
    /// Like `CleanV1` but drops short fragments
    CleanV2,
    /// Like `CleanV1` with diagonal fill of thick regions
    CleanV3,
    /// Dilated Canny edges reduced to centerlines
    Centerline,
    /// Canny edges joined into long smoothed strokes
    ThickV1,
    /// Like `ThickV1` with a wider join and stronger smoothing
    Thick,
    /// Like `CleanV1` with zigzag fill of thick regions
    Zigzag,
}

impl ExtractionPreset {
    /// Every preset, in display order
    pub const ALL: [ExtractionPreset; 7] = [
        Self::CleanV1,
        Self::CleanV2,
        Self::CleanV3,
        Self::Centerline,
        Self::ThickV1,
        Self::Thick,
        Self::Zigzag,
    ];

    /// Config name of the preset
    pub fn name(&self) -> &'static str {
        match self {
            Self::CleanV1 => "clean_v1",
            Self::CleanV2 => "clean_v2",
            Self::CleanV3 => "clean_v3",
            Self::Centerline => "centerline",
            Self::ThickV1 => "thick_v1",
            Self::Thick => "thick",
            Self::Zigzag => "zigzag",
        }
    }

    /// Parameters of the preset
    pub fn params(&self) -> ExtractorParams {
        let clean = ExtractorParams::default();
        let edges = ExtractorParams {
            mask_mode: MaskMode::Edges,
            denoise: false,
            skeleton_smooth_sigma: 0.0,
            ..ExtractorParams::default()
        };

        match self {
            Self::CleanV1 => clean,
            Self::CleanV2 => clean.with_min_segment_length(6),
            Self::CleanV3 => clean.with_fill(15.0, FillStyle::Diagonal, 4),
            Self::Centerline => edges.with_edge_thresholds(30.0, 100.0).with_dilation(2),
            Self::ThickV1 => edges
                .with_simplify_epsilon(1.0)
                .with_min_segment_length(5)
                .with_join_threshold(10.0)
                .with_smoothing(1.0),
            Self::Thick => edges
                .with_simplify_epsilon(1.0)
                .with_min_segment_length(5)
                .with_join_threshold(15.0)
                .with_smoothing(1.5),
            Self::Zigzag => clean.with_fill(15.0, FillStyle::Zigzag, 5),
        }
    }
}

impl fmt::Display for ExtractionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtractionPreset {
    type Err = CamToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| CamToolError::UnknownPreset(s.to_string()))
    }
}
