//! Batch controller
//!
//! One `Session` owns all mutable state of the measurement workflow: the
//! file queue, the active image, the view, the ROI being drawn, the
//! adjustments and the last measurement. Every user action is a method
//! call that runs to completion before returning.
//!
//! ```text
//! Idle → Loaded ⇄ Measuring → Finalized → Loaded | Complete
//! ```
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::config::SessionConfig;
use super::data::{MeasurementResult, Progress, SkippedFile};
use super::edit::AdjustmentSettings;
use super::library::ResultLog;
use super::queue::FileQueue;
use crate::error::{InnervationError, Result};
use crate::measure::index::{compute_index, processed_bbox, selected_samples, Measurement};
use crate::measure::threshold::ThresholdConfig;
use crate::raw::{load_calibrated, CalibratedImage};
use crate::ui::canvas::{CropRect, Point, ViewTransform, Viewport};
use crate::ui::frame::{colorize, paint_roi_overlay, render_preview, roi_ops, DrawOp, Frame, CROSSHAIR_SIZE};
use crate::ui::roi::{RoiEditor, RoiEvent, RoiInput, RoiMask};

/// Workflow state of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    /// No folder loaded yet
    Idle,
    /// A file is active, nothing measured
    Loaded,
    /// A file is active and has a current measurement
    Measuring,
    /// Save or discard chosen, about to advance
    Finalized,
    /// Queue exhausted
    Complete,
}

/// What pointer input is interpreted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    View,
    Draw,
    ZoomSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Primary,
    Secondary,
}

/// Pointer input in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Button press; `modifier` is the close-polygon modifier (Ctrl)
    Click {
        at: Point,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifier: bool,
    },
    /// Motion with the primary button held
    Drag { at: Point },
    /// Primary button released
    Release { at: Point },
    /// Motion without buttons (crosshair tracking)
    Move { at: Point },
}

/// Observable effect of a pointer event
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Ignored,
    ZoomStarted,
    Zoomed(CropRect),
    /// Selection too small; mode reverted to View
    SelectionRejected,
    Roi(RoiEvent),
}

/// The image currently being measured
#[derive(Debug)]
struct ActiveFile {
    name: String,
    image: CalibratedImage,
    view: ViewTransform,
}

/// The single owner of all workflow state
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: BatchState,
    queue: Option<FileQueue>,
    log: Option<ResultLog>,
    active: Option<ActiveFile>,
    adjustments: AdjustmentSettings,
    threshold: ThresholdConfig,
    show_overlay: bool,
    mode: InteractionMode,
    roi: RoiEditor,
    zoom_start: Option<Point>,
    zoom_current: Option<Point>,
    pointer: Option<Point>,
    measurement: Option<Measurement>,
    skipped: Vec<SkippedFile>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: BatchState::Idle,
            queue: None,
            log: None,
            active: None,
            adjustments: AdjustmentSettings::default(),
            threshold: config.threshold,
            show_overlay: config.show_overlay,
            mode: InteractionMode::View,
            roi: RoiEditor::new(config.roi_mode),
            zoom_start: None,
            zoom_current: None,
            pointer: None,
            measurement: None,
            skipped: Vec::new(),
            config,
        }
    }

    // ========== Accessors ==========

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn adjustments(&self) -> AdjustmentSettings {
        self.adjustments
    }

    pub fn threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    pub fn roi(&self) -> &RoiEditor {
        &self.roi
    }

    pub fn queue(&self) -> Option<&FileQueue> {
        self.queue.as_ref()
    }

    pub fn result_log(&self) -> Option<&ResultLog> {
        self.log.as_ref()
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Filename of the active image
    pub fn active_file(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    pub fn calibrated(&self) -> Option<&CalibratedImage> {
        self.active.as_ref().map(|a| &a.image)
    }

    pub fn view(&self) -> Option<&ViewTransform> {
        self.active.as_ref().map(|a| &a.view)
    }

    /// Position of the active file in the queue
    pub fn progress(&self) -> Option<Progress> {
        let queue = self.queue.as_ref()?;
        let active = self.active.as_ref()?;
        Some(Progress {
            position: queue.cursor() + 1,
            total: queue.len(),
            filename: active.name.clone(),
        })
    }

    /// Result label text
    pub fn result_text(&self) -> String {
        match &self.measurement {
            Some(m) => format!("Index: {:.4}%", m.index),
            None => "Current: --".to_string(),
        }
    }

    // ========== Folder & file lifecycle ==========

    /// Scan `folder`, create its result log if needed and load the first file
    pub fn load_folder(&mut self, folder: &Path) -> Result<BatchState> {
        let queue = FileQueue::scan(folder, &self.config.extensions)?;
        self.skipped.clear();
        if queue.is_empty() {
            warn!("⚠️  No images found in {}", folder.display());
            self.queue = Some(queue);
            self.log = None;
            self.unload();
            self.state = BatchState::Complete;
            return Ok(self.state);
        }

        let log = ResultLog::open_in(folder, &self.config.results_file)?;
        info!(
            "📂 Loaded folder {} ({} images, results in {})",
            folder.display(),
            queue.len(),
            log.path().display()
        );
        self.queue = Some(queue);
        self.log = Some(log);
        self.load_current();
        Ok(self.state)
    }

    /// Load the file under the cursor, skipping files that fail to load
    fn load_current(&mut self) {
        self.unload();
        loop {
            let Some(queue) = self.queue.as_mut() else {
                self.state = BatchState::Idle;
                return;
            };
            let (Some(name), Some(path)) = (queue.current().map(str::to_string), queue.current_path()) else {
                info!("✅ Processing complete ({} skipped)", self.skipped.len());
                self.state = BatchState::Complete;
                return;
            };

            match load_calibrated(&path) {
                Ok(image) => {
                    let view = ViewTransform::new(image.width(), image.height(), self.config.viewport);
                    info!(
                        "🖼️  ({}/{}) {}",
                        queue.cursor() + 1,
                        queue.len(),
                        name
                    );
                    self.active = Some(ActiveFile { name, image, view });
                    self.state = BatchState::Loaded;
                    return;
                }
                Err(err) => {
                    warn!("⚠️  Skipping {}: {}", name, err);
                    self.skipped.push(SkippedFile {
                        filename: name,
                        reason: err.to_string(),
                    });
                    queue.advance();
                }
            }
        }
    }

    /// Drop the active image and all per-file interaction state
    fn unload(&mut self) {
        self.active = None;
        self.adjustments.reset();
        self.roi.clear();
        self.mode = InteractionMode::View;
        self.zoom_start = None;
        self.zoom_current = None;
        self.measurement = None;
    }

    fn active_mut(&mut self) -> Result<&mut ActiveFile> {
        self.active.as_mut().ok_or(InnervationError::NoActiveFile)
    }

    fn active_ref(&self) -> Result<&ActiveFile> {
        self.active.as_ref().ok_or(InnervationError::NoActiveFile)
    }

    // ========== Adjustments & threshold ==========

    /// Replace the adjustments; a previous measurement becomes stale
    pub fn set_adjustments(&mut self, settings: AdjustmentSettings) -> Result<()> {
        self.active_ref()?;
        self.adjustments = settings.clamped();
        self.invalidate_measurement();
        debug!("🎨 Adjustments: {:?}", self.adjustments);
        Ok(())
    }

    pub fn set_threshold(&mut self, config: ThresholdConfig) {
        self.threshold = config;
        self.invalidate_measurement();
    }

    /// Fixed cutoff from free text; invalid text falls back to the default
    pub fn set_cutoff_text(&mut self, text: &str) {
        self.set_threshold(ThresholdConfig::cutoff_or_default(text));
    }

    pub fn set_overlay(&mut self, show: bool) {
        self.show_overlay = show;
    }

    fn invalidate_measurement(&mut self) {
        if self.measurement.take().is_some() {
            self.state = BatchState::Loaded;
        }
    }

    // ========== View ==========

    /// Arm zoom selection; the next press/drag/release picks the rectangle
    pub fn start_zoom(&mut self) -> Result<()> {
        self.active_ref()?;
        self.set_mode(InteractionMode::ZoomSelect);
        Ok(())
    }

    /// One zoom-out step; returns `false` when already at full extent
    pub fn zoom_out(&mut self) -> Result<bool> {
        let factor = self.config.zoom_out_factor;
        let changed = self.active_mut()?.view.zoom_out(factor);
        self.set_mode(InteractionMode::View);
        Ok(changed)
    }

    pub fn reset_view(&mut self) -> Result<()> {
        self.active_mut()?.view.reset();
        self.set_mode(InteractionMode::View);
        Ok(())
    }

    /// New canvas size; drawn points refer to the old layout and are dropped
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        if let Some(active) = self.active.as_mut() {
            active.view.set_viewport(viewport);
        }
        self.roi.clear();
    }

    // ========== ROI ==========

    /// Enter draw mode with an empty ROI
    pub fn start_drawing(&mut self) -> Result<()> {
        self.active_ref()?;
        self.set_mode(InteractionMode::Draw);
        Ok(())
    }

    /// Switching mode abandons in-progress ROI points and zoom corners
    fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
        self.roi.clear();
        self.zoom_start = None;
        self.zoom_current = None;
    }

    /// Route one pointer event according to the interaction mode
    pub fn pointer(&mut self, event: InputEvent) -> Result<PointerOutcome> {
        self.active_ref()?;
        if let InputEvent::Move { at } = event {
            self.pointer = Some(at);
            return Ok(PointerOutcome::Ignored);
        }

        match self.mode {
            InteractionMode::View => Ok(PointerOutcome::Ignored),
            InteractionMode::ZoomSelect => self.zoom_pointer(event),
            InteractionMode::Draw => Ok(self.draw_pointer(event)),
        }
    }

    fn zoom_pointer(&mut self, event: InputEvent) -> Result<PointerOutcome> {
        match event {
            InputEvent::Click {
                at,
                button: MouseButton::Primary,
                ..
            } => {
                self.pointer = Some(at);
                self.zoom_start = Some(at);
                self.zoom_current = Some(at);
                Ok(PointerOutcome::ZoomStarted)
            }
            InputEvent::Drag { at } => {
                self.pointer = Some(at);
                if self.zoom_start.is_some() {
                    self.zoom_current = Some(at);
                }
                Ok(PointerOutcome::Ignored)
            }
            InputEvent::Release { at } => {
                let Some(start) = self.zoom_start else {
                    return Ok(PointerOutcome::Ignored);
                };
                let min_size = self.config.min_zoom_size;
                let result = self.active_mut()?.view.zoom_in(start, at, min_size);
                self.set_mode(InteractionMode::View);
                match result {
                    Ok(crop) => Ok(PointerOutcome::Zoomed(crop)),
                    Err(err) => {
                        info!("🔍 {}", err);
                        Ok(PointerOutcome::SelectionRejected)
                    }
                }
            }
            _ => Ok(PointerOutcome::Ignored),
        }
    }

    fn draw_pointer(&mut self, event: InputEvent) -> PointerOutcome {
        let input = match event {
            InputEvent::Click {
                button: MouseButton::Secondary,
                ..
            }
            | InputEvent::Click { modifier: true, .. } => RoiInput::Close,
            InputEvent::Click { at, .. } => RoiInput::Press(at),
            InputEvent::Drag { at } => RoiInput::Drag(at),
            InputEvent::Release { at } => RoiInput::Release(at),
            InputEvent::Move { .. } => return PointerOutcome::Ignored,
        };
        if let RoiInput::Press(at) | RoiInput::Drag(at) | RoiInput::Release(at) = input {
            self.pointer = Some(at);
        }

        let event = self.roi.handle(input);
        if event == RoiEvent::Rejected {
            info!("✏️  ROI needs at least 3 points, back to view mode");
            self.set_mode(InteractionMode::View);
        }
        PointerOutcome::Roi(event)
    }

    /// Mask of the finalized ROI in image coordinates
    pub fn roi_mask(&self) -> Option<RoiMask> {
        let active = self.active.as_ref()?;
        let shape = self.roi.shape()?;
        Some(shape.rasterize(
            &active.view.mapping(),
            active.image.width(),
            active.image.height(),
        ))
    }

    // ========== Measurement ==========

    /// Compute the index for the finalized ROI
    ///
    /// Without a finalized ROI nothing is computed and `RoiMissing` is
    /// returned.
    pub fn calculate(&mut self) -> Result<Measurement> {
        let active = self.active_ref()?;
        let Some(mask) = self.roi_mask() else {
            warn!("⚠️  Please draw an area first");
            return Err(InnervationError::RoiMissing);
        };

        let measurement = compute_index(&active.image, &mask, &self.adjustments, &self.threshold);
        self.measurement = Some(measurement);
        self.state = BatchState::Measuring;
        Ok(measurement)
    }

    /// Append the current measurement to the log and advance
    ///
    /// If the row cannot be written the cursor does not move.
    pub fn save_and_next(&mut self) -> Result<MeasurementResult> {
        let name = self.active_ref()?.name.clone();
        let measurement = self.measurement.ok_or(InnervationError::NoMeasurement)?;
        let result = MeasurementResult::new(name, measurement.index);

        let log = self.log.as_ref().ok_or(InnervationError::NoActiveFile)?;
        log.append(&result)?;
        info!("💾 Saved {} = {:.6}", result.filename, result.index);

        self.advance();
        Ok(result)
    }

    /// Advance without writing anything
    pub fn discard_and_next(&mut self) -> Result<String> {
        let name = self.active_ref()?.name.clone();
        info!("❌ Discarded {}", name);
        self.advance();
        Ok(name)
    }

    fn advance(&mut self) {
        self.state = BatchState::Finalized;
        if let Some(queue) = self.queue.as_mut() {
            queue.advance();
        }
        self.load_current();
    }

    // ========== Rendering ==========

    /// Threshold used by the red overlay
    ///
    /// Fixed cutoffs are used as-is. Otsu is fitted on the ROI population
    /// when a shape is finalized (the same samples the index uses), and on
    /// the non-zero preview pixels otherwise.
    fn overlay_threshold(&self, preview: &[u8], roi_samples: Option<&[u8]>) -> Option<f64> {
        if !self.show_overlay {
            return None;
        }
        match (self.threshold, roi_samples) {
            (ThresholdConfig::FixedCutoff(value), _) => Some(value),
            (config, Some(samples)) => Some(config.resolve(samples)),
            (config, None) => {
                let non_zero: Vec<u8> = preview.iter().copied().filter(|&v| v > 0).collect();
                Some(config.resolve(&non_zero))
            }
        }
    }

    /// One complete render pass of the active file
    ///
    /// Inside a finalized ROI the overlay is painted from the same processed
    /// bounding box and threshold `calculate` uses.
    pub fn render(&self) -> Result<Frame> {
        let active = self.active_ref()?;
        let (preview, mapping) = render_preview(&active.image, &active.view, &self.adjustments);

        let roi = if self.show_overlay {
            self.roi_mask().and_then(|mask| {
                let processed = processed_bbox(&active.image, &mask, &self.adjustments)?;
                Some((mask, processed))
            })
        } else {
            None
        };
        let roi_samples = roi.as_ref().map(|(mask, processed)| selected_samples(processed, mask));
        let threshold = self.overlay_threshold(preview.as_raw(), roi_samples.as_deref());

        let mut image = colorize(&preview, threshold);
        if let (Some(t), Some((mask, processed))) = (threshold, &roi) {
            paint_roi_overlay(&mut image, &preview, &mapping, mask, processed, t);
        }

        let mut ops = roi_ops(self.roi.points(), self.roi.shape().is_some());
        if let (InteractionMode::ZoomSelect, Some(from), Some(to)) =
            (self.mode, self.zoom_start, self.zoom_current)
        {
            ops.push(DrawOp::ZoomBand { from, to });
        }
        if matches!(self.mode, InteractionMode::Draw | InteractionMode::ZoomSelect) {
            if let Some(at) = self.pointer {
                ops.push(DrawOp::Crosshair {
                    at,
                    size: CROSSHAIR_SIZE,
                });
            }
        }

        Ok(Frame { image, mapping, ops })
    }
}
