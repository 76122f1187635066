use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::capture::domain::camera_alert::CameraAlert;
use crate::capture::domain::camera_devices::CameraStatus;
use crate::capture::domain::capture_source::CaptureSource;
use crate::detection::domain::adapter_config::{
    AdapterConfig, Delegate, FaceMeshDrawingMode, RunningMode,
};
use crate::detection::domain::detection_mode::DetectionMode;
use crate::detection::domain::model_adapter::{ModelAdapter, Reconfiguration};
use crate::detection::domain::model_load_result::ModelLoadResult;
use crate::detection::domain::vision_model::{AdapterError, VisionRuntime};
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::constants::DEFAULT_LOOP_INTERVAL;

use super::frame_loop::{run_tick, AdapterRegistry, TickOutcome};
use super::loop_logger::{LoopLogger, NullLoopLogger};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("{0} is not available")]
    ModeUnavailable(DetectionMode),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Partial adapter settings, as read from a settings file or CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSettings {
    pub score_threshold: Option<f32>,
    pub max_results: Option<usize>,
    pub delegate: Option<Delegate>,
    pub running_mode: Option<RunningMode>,
    pub drawing_mode: Option<FaceMeshDrawingMode>,
}

impl ModelSettings {
    /// Fields set in `other` win.
    pub fn merged(&self, other: &ModelSettings) -> ModelSettings {
        ModelSettings {
            score_threshold: other.score_threshold.or(self.score_threshold),
            max_results: other.max_results.or(self.max_results),
            delegate: other.delegate.or(self.delegate),
            running_mode: other.running_mode.or(self.running_mode),
            drawing_mode: other.drawing_mode.or(self.drawing_mode),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ModelSettings::default()
    }
}

/// Owns the adapters, the render surface and the loop state.
///
/// Selects the active mode, forwards setting changes to the active adapter
/// and runs one frame-loop tick at a time.
pub struct OverlayController {
    adapters: AdapterRegistry,
    surface: RenderSurface,
    source: Option<Box<dyn CaptureSource>>,
    logger: Box<dyn LoopLogger>,
    mode: DetectionMode,
    load_results: Vec<ModelLoadResult>,
    loading: bool,
    delay: Option<Duration>,
    mirrored: bool,
    camera_status: Option<CameraStatus>,
    alert: CameraAlert,
    ticks: usize,
}

impl OverlayController {
    pub fn new(adapters: Vec<Box<dyn ModelAdapter>>, surface: RenderSurface) -> Self {
        Self {
            adapters: AdapterRegistry::new(adapters),
            surface,
            source: None,
            logger: Box::new(NullLoopLogger),
            mode: DetectionMode::None,
            load_results: Vec::new(),
            loading: true,
            delay: Some(DEFAULT_LOOP_INTERVAL),
            mirrored: false,
            camera_status: None,
            alert: CameraAlert::new(),
            ticks: 0,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn LoopLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Loads every adapter in startup order and activates the first that
    /// succeeded. Returns the successful loads.
    pub fn init_models(&mut self, runtime: &dyn VisionRuntime) -> &[ModelLoadResult] {
        self.loading = true;
        let mut results = Vec::new();
        for mode in self.adapters.modes() {
            if let Some(adapter) = self.adapters.get_mut(mode) {
                results.push(adapter.load(runtime));
            }
        }

        self.mode = ModelLoadResult::initial_mode(&results);
        self.load_results = ModelLoadResult::enabled(results);
        self.loading = false;

        let names: Vec<_> = self.load_results.iter().map(|r| r.mode.short_name()).collect();
        self.logger.info(&format!(
            "Loaded {} of {} models [{}], active mode: {}",
            self.load_results.len(),
            self.adapters.len(),
            names.join(", "),
            self.mode
        ));
        &self.load_results
    }

    pub fn load_results(&self) -> &[ModelLoadResult] {
        &self.load_results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_mode_available(&self, mode: DetectionMode) -> bool {
        self.load_results.iter().any(|r| r.mode == mode)
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Switches the active mode; picked up by the next tick.
    ///
    /// `None` is always accepted. Entering face-landmark mode resets its
    /// drawing mode to the tesselation mesh.
    pub fn set_mode(&mut self, mode: DetectionMode) -> Result<(), ControllerError> {
        if mode != DetectionMode::None && !self.is_mode_available(mode) {
            return Err(ControllerError::ModeUnavailable(mode));
        }
        if mode == DetectionMode::FaceLandmark {
            if let Some(adapter) = self.adapters.get_mut(mode) {
                adapter.set_drawing_mode(FaceMeshDrawingMode::Tesselation);
            }
        }
        if mode != self.mode {
            log::info!("Mode: {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        Ok(())
    }

    fn active_adapter(&mut self) -> Result<&mut (dyn ModelAdapter + 'static), ControllerError> {
        let mode = self.mode;
        self.adapters
            .get_mut(mode)
            .ok_or(ControllerError::ModeUnavailable(mode))
    }

    pub fn active_config(&self) -> Option<&AdapterConfig> {
        self.adapters.get(self.mode).map(|a| a.config())
    }

    pub fn config_for(&self, mode: DetectionMode) -> Option<&AdapterConfig> {
        self.adapters.get(mode).map(|a| a.config())
    }

    pub fn set_score_threshold(&mut self, score: f32) -> Result<(), ControllerError> {
        self.active_adapter()?.set_score_threshold(score);
        Ok(())
    }

    pub fn set_max_results(&mut self, max: usize) -> Result<(), ControllerError> {
        self.active_adapter()?.set_max_results(max);
        Ok(())
    }

    pub fn set_delegate(&mut self, delegate: Delegate) -> Result<(), ControllerError> {
        self.active_adapter()?.set_delegate(delegate);
        Ok(())
    }

    pub fn set_running_mode(&mut self, running_mode: RunningMode) -> Result<(), ControllerError> {
        self.active_adapter()?.set_running_mode(running_mode);
        Ok(())
    }

    pub fn set_drawing_mode(&mut self, drawing_mode: FaceMeshDrawingMode) -> Result<(), ControllerError> {
        self.active_adapter()?.set_drawing_mode(drawing_mode);
        Ok(())
    }

    /// Pushes the active adapter's settings to its live detector.
    pub fn update_config(&mut self) -> Result<Reconfiguration, ControllerError> {
        Ok(self.active_adapter()?.update_config()?)
    }

    /// Applies `settings` to the adapter for `mode` and reconfigures it.
    pub fn apply_settings(
        &mut self,
        mode: DetectionMode,
        settings: &ModelSettings,
    ) -> Result<Reconfiguration, ControllerError> {
        if !self.is_mode_available(mode) {
            return Err(ControllerError::ModeUnavailable(mode));
        }
        let adapter = self
            .adapters
            .get_mut(mode)
            .ok_or(ControllerError::ModeUnavailable(mode))?;
        if let Some(score) = settings.score_threshold {
            adapter.set_score_threshold(score);
        }
        if let Some(max) = settings.max_results {
            adapter.set_max_results(max);
        }
        if let Some(delegate) = settings.delegate {
            adapter.set_delegate(delegate);
        }
        if let Some(running_mode) = settings.running_mode {
            adapter.set_running_mode(running_mode);
        }
        if let Some(drawing_mode) = settings.drawing_mode {
            adapter.set_drawing_mode(drawing_mode);
        }
        Ok(adapter.update_config()?)
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// `None` stops the loop after the current tick.
    pub fn set_delay(&mut self, delay: Option<Duration>) {
        self.delay = delay;
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    pub fn attach_source(&mut self, source: Box<dyn CaptureSource>) {
        if let Some((w, h)) = source.resolution() {
            self.surface.init_scene(w, h);
        }
        self.detach_source();
        self.source = Some(source);
    }

    pub fn detach_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
    }

    pub fn has_running_source(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_running())
    }

    pub fn camera_status(&self) -> Option<CameraStatus> {
        self.camera_status
    }

    /// Records the camera status and returns the alert to show, if any.
    pub fn on_camera_status(&mut self, status: CameraStatus) -> Option<&'static str> {
        self.camera_status = Some(status);
        self.poll_camera_alert()
    }

    /// Re-checks the current status; fires once loading has finished.
    pub fn poll_camera_alert(&mut self) -> Option<&'static str> {
        let status = self.camera_status?;
        let message = self.alert.observe(status, self.loading);
        if let Some(message) = message {
            log::warn!("{message}");
        }
        message
    }

    fn camera_ok(&self) -> bool {
        !matches!(
            self.camera_status,
            Some(CameraStatus::PermissionError | CameraStatus::NoDevices)
        )
    }

    /// One frame-loop pass.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        self.logger.tick(self.ticks);

        let frame = if self.camera_ok() {
            self.source.as_ref().and_then(|s| s.latest_frame())
        } else {
            None
        };
        run_tick(
            &mut self.adapters,
            self.mode,
            frame,
            &mut self.surface,
            self.mirrored,
            self.logger.as_mut(),
        )
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RenderSurface {
        &mut self.surface
    }

    /// Stops capture and reports the loop summary.
    pub fn shutdown(&mut self) {
        self.detach_source();
        self.logger.summary();
    }

    /// Returns to the constructed state, including each adapter's default
    /// settings. Adapters keep their detectors; call
    /// [`init_models`](Self::init_models) to rebuild them and select a mode.
    pub fn reset(&mut self) {
        self.detach_source();
        for mode in self.adapters.modes() {
            if let Some(adapter) = self.adapters.get_mut(mode) {
                adapter.reset_config();
            }
        }
        self.mode = DetectionMode::None;
        self.load_results.clear();
        self.loading = true;
        self.delay = Some(DEFAULT_LOOP_INTERVAL);
        self.mirrored = false;
        self.camera_status = None;
        self.alert.reset();
        self.ticks = 0;
        self.surface.clear_scene();
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        self.detach_source();
    }
}
