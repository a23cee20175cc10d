//! # PenArm CAM Tools
//!
//! The pure computation half of PenArm: everything between a raster image and
//! the list of motion commands the arm replays.
//!
//! ## Pipeline
//!
//! - **Stroke Extractor**: mask, thin, trace, fill and join pen strokes
//! - **Path Order Optimizer**: greedy nearest-neighbour stroke ordering
//! - **Calibration Mapper**: rotate, scale and center into the drawing area
//! - **Command Generator**: `Move`/`Draw` commands under a command budget
//!
//! ## Supporting Tools
//!
//! - **Segment Sampler**: flattens bezier and arc primitives
//! - **G-code Export**: dry-run programs
//! - **Preview**: renders strokes for comparing presets
//!
//! No stage holds shared mutable state, so pipelines may run concurrently.

pub mod calibration_mapper;
pub mod command_generator;
pub mod error;
pub mod gcode_export;
pub mod optimizer;
pub mod polyline;
pub mod preview;
pub mod raster;
pub mod segment_sampler;
pub mod stroke;
pub mod stroke_extractor;

// Re-export commonly used items
pub use calibration_mapper::{CalibrationMapper, MappedStrokes, Placement};
pub use command_generator::{generate, CommandGenerator, GenerationResult, GeneratorParams};
pub use error::{CamToolError, CamToolResult, ParameterError};
pub use gcode_export::export_gcode;
pub use optimizer::PathOrderOptimizer;
pub use preview::render_preview;
pub use raster::{load_raster, RasterImage};
pub use segment_sampler::{sample_segment, DrawPath, PathSegment, CURVE_SAMPLES};
pub use stroke::{Direction, OrientedStroke, Stroke};
pub use stroke_extractor::{
    extract, join_strokes, ExtractionPreset, ExtractorParams, FillStyle, MaskMode,
    StrokeExtractor,
};
