//! Drawing session
//!
//! Plans a drawing (extract, order, map, generate) and replays it on the arm
//! while publishing progress. Only one session can drive the arm at a time:
//! execution takes the arm's lock for its whole duration and a second
//! session fails with `Busy` instead of waiting.

use penarm_camtools::{
    CalibrationMapper, CamToolResult, CommandGenerator, ExtractionPreset, ExtractorParams,
    GenerationResult, GeneratorParams, PathOrderOptimizer, RasterImage, StrokeExtractor,
};
use penarm_communication::Arm;
use penarm_core::{
    ControllerError, DrawingArea, DrawingEvent, EventDispatcher, MotionCommand, Progress,
    ProgressCounter, Result, ThreadSafe,
};
use std::time::Duration;

/// Status message shown once every command has been executed
pub const FINISHED_MESSAGE: &str = "Your drawing is ready!";

/// Pipeline settings for planning a drawing
#[derive(Debug, Clone, PartialEq)]
pub struct PlanParams {
    /// Stroke extraction settings
    pub extractor: ExtractorParams,
    /// Pen-up height above the drawing surface
    pub pen_lift: f64,
    /// Feedrate of drawing moves
    pub feedrate_draw: f64,
    /// Feedrate of travel moves
    pub feedrate_move: f64,
    /// Command budget
    pub max_commands: usize,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            extractor: ExtractionPreset::CleanV1.params(),
            pen_lift: 16.0,
            feedrate_draw: 8000.0,
            feedrate_move: 8000.0,
            max_commands: 5000,
        }
    }
}

impl PlanParams {
    /// Use the settings of a named extraction preset
    pub fn with_preset(mut self, preset: ExtractionPreset) -> Self {
        self.extractor = preset.params();
        self
    }
}

/// A drawing ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingPlan {
    /// Area the drawing was mapped into
    pub area: DrawingArea,
    /// Strokes found in the image
    pub extracted_strokes: usize,
    /// Strokes left after clipping to the area
    pub mapped_strokes: usize,
    /// Whether the image was turned to match the area's orientation
    pub rotated: bool,
    /// Pen-up travel before and after ordering, in pixels
    pub travel: (f64, f64),
    /// Generated commands and budget accounting
    pub generation: GenerationResult,
}

impl DrawingPlan {
    /// Commands in execution order
    pub fn commands(&self) -> &[MotionCommand] {
        &self.generation.commands
    }

    /// Strokes dropped by the command budget
    pub fn skipped_strokes(&self) -> usize {
        self.generation.skipped_strokes
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.generation.is_empty()
    }
}

/// Run the image pipeline for `area`
pub fn plan(image: &RasterImage, area: &DrawingArea, params: &PlanParams) -> CamToolResult<DrawingPlan> {
    let strokes = StrokeExtractor::new(params.extractor.clone())?.extract(image);
    let ordered = PathOrderOptimizer::order(&strokes);
    let travel = (
        PathOrderOptimizer::input_travel_distance(&strokes),
        PathOrderOptimizer::travel_distance(&ordered),
    );

    let mapped = CalibrationMapper::map_to_machine(&ordered, image.width(), image.height(), area);
    let generator = CommandGenerator::new(
        GeneratorParams::for_area(area, params.pen_lift)
            .with_feedrates(params.feedrate_draw, params.feedrate_move)
            .with_max_commands(params.max_commands),
    );
    let generation = generator.generate(&mapped.strokes);

    tracing::info!(
        "Planned {} commands from {} strokes ({} after clipping, {} skipped){}",
        generation.len(),
        strokes.len(),
        mapped.strokes.len(),
        generation.skipped_strokes,
        if mapped.rotated { ", rotated" } else { "" }
    );

    Ok(DrawingPlan {
        area: *area,
        extracted_strokes: strokes.len(),
        mapped_strokes: mapped.strokes.len(),
        rotated: mapped.rotated,
        travel,
        generation,
    })
}

/// Executes drawing plans on a shared arm
pub struct DrawingSession {
    arm: ThreadSafe<Arm>,
    progress: ProgressCounter,
    events: EventDispatcher,
    finish_hold: Duration,
}

impl DrawingSession {
    /// Session over `arm`, publishing on the arm's event dispatcher
    pub fn new(arm: ThreadSafe<Arm>) -> Self {
        let events = arm.lock().events().clone();
        Self {
            arm,
            progress: ProgressCounter::new(),
            events,
            finish_hold: Duration::from_secs(5),
        }
    }

    /// How long the finished state stays visible before progress resets
    pub fn with_finish_hold(mut self, hold: Duration) -> Self {
        self.finish_hold = hold;
        self
    }

    /// Handle for progress observers
    pub fn progress(&self) -> ProgressCounter {
        self.progress.clone()
    }

    /// Current progress
    pub fn snapshot(&self) -> Progress {
        self.progress.snapshot()
    }

    /// Event dispatcher session events are published on
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Plan a drawing for the arm's calibrated area
    pub fn plan(&self, image: &RasterImage, params: &PlanParams) -> Result<DrawingPlan> {
        let area = self.arm.lock().drawing_area()?;
        Ok(plan(image, &area, params)?)
    }

    /// Draw `plan` on the arm
    ///
    /// Progress is updated after every command. On success the arm returns
    /// to rest and is released while the finished message is held. On failure the arm still tries to return to rest, which is
    /// only logged if it fails, and the original error is returned.
    pub fn execute(&self, plan: &DrawingPlan) -> Result<()> {
        let mut arm = self.arm.try_lock().ok_or(ControllerError::Busy)?;
        if !arm.is_connected() {
            return Err(ControllerError::NotConnected.into());
        }
        if !arm.is_calibrated() {
            return Err(ControllerError::NotCalibrated.into());
        }
        if plan.is_empty() {
            tracing::info!("Nothing to draw");
            return Ok(());
        }

        let total = plan.commands().len();
        tracing::info!("Executing {} drawing commands", total);
        self.progress.start(total, "Drawing");

        match self.run(&mut arm, plan.commands()) {
            Ok(()) => {
                self.progress.set_current(total);
                self.progress.set_message(FINISHED_MESSAGE);
                self.events.publish(DrawingEvent::SessionFinished);
                tracing::info!("Drawing complete, returning to rest");

                let rested = arm.go_to_resting_position();
                drop(arm);
                std::thread::sleep(self.finish_hold);
                self.progress.reset();
                rested
            }
            Err(e) => {
                tracing::error!("Drawing failed: {}", e);
                self.progress.reset();
                self.events.publish(DrawingEvent::SessionFailed(e.to_string()));
                if arm.is_connected() {
                    if let Err(rest_err) = arm.go_to_resting_position() {
                        tracing::warn!("Could not return to rest after failure: {}", rest_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn run(&self, arm: &mut Arm, commands: &[MotionCommand]) -> Result<()> {
        let total = commands.len();
        for (i, command) in commands.iter().enumerate() {
            arm.execute(command)?;
            self.progress.set_current(i + 1);
            self.events.publish(DrawingEvent::Progress {
                current: i + 1,
                total,
            });
            if i % 50 == 0 {
                tracing::debug!("Progress: {}%", i * 100 / total);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DrawingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSession")
            .field("progress", &self.progress.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn bar_image() -> RasterImage {
        let mut img = GrayImage::from_pixel(100, 100, Luma([255]));
        for y in 47..53 {
            for x in 30..70 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        RasterImage::from_luma(img).unwrap()
    }

    #[test]
    fn test_plan_bar() {
        let area = DrawingArea::new(0.0, 0.0, 200.0, 200.0, 0.0).unwrap();
        let params = PlanParams {
            extractor: ExtractorParams::default()
                .with_mask_mode(penarm_camtools::MaskMode::Fixed(128)),
            ..Default::default()
        };
        let plan = plan(&bar_image(), &area, &params).unwrap();
        assert_eq!(plan.extracted_strokes, 1);
        assert!(!plan.rotated);
        assert_eq!(plan.skipped_strokes(), 0);
        let commands = plan.commands();
        assert!(commands.len() >= 3);
        assert_eq!(commands[0].z, 16.0);
        assert_eq!(commands[1].z, 0.0);
        assert_eq!(commands[commands.len() - 1].z, 16.0);
    }

    #[test]
    fn test_plan_blank_image_is_empty() {
        let area = DrawingArea::new(0.0, 0.0, 200.0, 200.0, 0.0).unwrap();
        let blank = RasterImage::from_luma(GrayImage::from_pixel(40, 40, Luma([255]))).unwrap();
        let plan = plan(&blank, &area, &PlanParams::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.extracted_strokes, 0);
    }

    #[test]
    fn test_plan_params_preset() {
        let params = PlanParams::default().with_preset(ExtractionPreset::Thick);
        assert_eq!(params.extractor, ExtractionPreset::Thick.params());
    }
}
