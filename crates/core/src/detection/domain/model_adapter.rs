use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;

use crate::rendering::domain::face_landmark_painter::FaceLandmarkPainter;
use crate::rendering::domain::face_painter::FacePainter;
use crate::rendering::domain::gesture_painter::GesturePainter;
use crate::rendering::domain::object_painter::ObjectPainter;
use crate::rendering::domain::overlay_painter::OverlayPainter;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::frame::Frame;

use super::adapter_config::{AdapterConfig, Delegate, FaceMeshDrawingMode, RunningMode};
use super::detection_mode::DetectionMode;
use super::detection_result::DetectionResult;
use super::model_load_result::ModelLoadResult;
use super::vision_model::{AdapterError, VisionModel, VisionRuntime};

/// One selectable overlay mode: a detector plus the routine that draws its
/// output.
pub trait ModelAdapter: Send {
    fn mode(&self) -> DetectionMode;

    /// Builds the detector. Failures are logged and reported in the result,
    /// never returned.
    fn load(&mut self, runtime: &dyn VisionRuntime) -> ModelLoadResult;

    fn is_loaded(&self) -> bool;

    /// Runs the detector on `frame`. Failures are logged and yield `None`.
    fn detect(&mut self, frame: &Frame) -> Option<DetectionResult>;

    fn draw(
        &self,
        surface: &mut RenderSurface,
        mirrored: bool,
        result: &DetectionResult,
        width: u32,
        height: u32,
    );

    fn config(&self) -> &AdapterConfig;

    fn set_score_threshold(&mut self, score: f32);
    fn set_max_results(&mut self, max: usize);
    fn set_delegate(&mut self, delegate: Delegate);
    fn set_running_mode(&mut self, mode: RunningMode);
    fn set_drawing_mode(&mut self, mode: FaceMeshDrawingMode);

    /// Restores the mode's default settings in memory. The live detector
    /// picks them up on the next `load` or `update_config`.
    fn reset_config(&mut self);

    /// Pushes the in-memory config to the live detector on a worker thread.
    ///
    /// Only one reconfiguration runs at a time; a second call while one is
    /// in flight returns [`AdapterError::ReconfigureInFlight`].
    fn update_config(&mut self) -> Result<Reconfiguration, AdapterError>;

    /// True while a reconfiguration is running.
    fn is_busy(&self) -> bool;
}

/// Single-slot in-flight flag.
#[derive(Clone, Default)]
pub struct ReconfigureGuard {
    flag: Arc<AtomicBool>,
}

impl ReconfigureGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot, or returns `None` when it is already taken.
    pub fn try_begin(&self) -> Option<InFlight> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                flag: Arc::clone(&self.flag),
            })
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Releases the guard when dropped, whether the work succeeded, failed or
/// panicked.
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Handle to a running reconfiguration.
pub struct Reconfiguration {
    handle: JoinHandle<Result<(), AdapterError>>,
}

impl Reconfiguration {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn wait(self) -> Result<(), AdapterError> {
        self.handle
            .join()
            .map_err(|_| AdapterError::Runtime("reconfiguration worker panicked".into()))?
    }
}

type SharedModel = Arc<Mutex<Option<Box<dyn VisionModel>>>>;

/// [`ModelAdapter`] over any [`VisionModel`] produced by the runtime.
pub struct VisionAdapter {
    mode: DetectionMode,
    config: AdapterConfig,
    model: SharedModel,
    guard: ReconfigureGuard,
    painter: Box<dyn OverlayPainter>,
    started: Instant,
}

impl VisionAdapter {
    pub fn new(mode: DetectionMode, painter: Box<dyn OverlayPainter>) -> Self {
        Self {
            mode,
            config: AdapterConfig::for_mode(mode),
            model: Arc::new(Mutex::new(None)),
            guard: ReconfigureGuard::new(),
            painter,
            started: Instant::now(),
        }
    }

    pub fn object() -> Self {
        Self::new(DetectionMode::Object, Box::new(ObjectPainter))
    }

    pub fn face() -> Self {
        Self::new(DetectionMode::Face, Box::new(FacePainter))
    }

    pub fn gesture() -> Self {
        Self::new(DetectionMode::Gesture, Box::new(GesturePainter))
    }

    pub fn face_landmark() -> Self {
        Self::new(DetectionMode::FaceLandmark, Box::new(FaceLandmarkPainter))
    }

    /// One adapter per selectable mode, in startup order.
    pub fn all() -> Vec<Box<dyn ModelAdapter>> {
        vec![
            Box::new(Self::object()),
            Box::new(Self::face()),
            Box::new(Self::gesture()),
            Box::new(Self::face_landmark()),
        ]
    }

    fn timestamp_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl ModelAdapter for VisionAdapter {
    fn mode(&self) -> DetectionMode {
        self.mode
    }

    fn load(&mut self, runtime: &dyn VisionRuntime) -> ModelLoadResult {
        match runtime.create_model(self.mode, &self.config) {
            Ok(model) => {
                *self.model.lock() = Some(model);
                log::info!("{} model loaded", self.mode);
                ModelLoadResult::loaded(self.mode)
            }
            Err(e) => {
                log::warn!("Failed to load {} model: {e}", self.mode);
                ModelLoadResult::failed(self.mode)
            }
        }
    }

    fn is_loaded(&self) -> bool {
        self.model.lock().is_some()
    }

    fn detect(&mut self, frame: &Frame) -> Option<DetectionResult> {
        let timestamp = self.timestamp_ms();
        let Some(mut slot) = self.model.try_lock() else {
            log::debug!("{} model busy, skipping frame {}", self.mode, frame.index());
            return None;
        };
        let model = slot.as_mut()?;
        match model.infer(frame, timestamp) {
            Ok(result) => Some(result),
            Err(e) => {
                log::warn!("{} detection failed: {e}", self.mode);
                None
            }
        }
    }

    fn draw(
        &self,
        surface: &mut RenderSurface,
        mirrored: bool,
        result: &DetectionResult,
        width: u32,
        height: u32,
    ) {
        self.painter
            .paint(surface, &self.config, mirrored, result, width, height);
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn set_score_threshold(&mut self, score: f32) {
        self.config.set_score_threshold(score);
    }

    fn set_max_results(&mut self, max: usize) {
        self.config.set_max_results(max);
    }

    fn set_delegate(&mut self, delegate: Delegate) {
        self.config.set_delegate(delegate);
    }

    fn set_running_mode(&mut self, mode: RunningMode) {
        self.config.set_running_mode(mode);
    }

    fn set_drawing_mode(&mut self, mode: FaceMeshDrawingMode) {
        self.config.set_drawing_mode(mode);
    }

    fn reset_config(&mut self) {
        self.config = AdapterConfig::for_mode(self.mode);
    }

    fn update_config(&mut self) -> Result<Reconfiguration, AdapterError> {
        if !self.is_loaded() {
            return Err(AdapterError::NotLoaded(self.mode));
        }
        let token = self
            .guard
            .try_begin()
            .ok_or(AdapterError::ReconfigureInFlight(self.mode))?;

        let mode = self.mode;
        let config = self.config.clone();
        let model = Arc::clone(&self.model);
        log::debug!("Reconfiguring {mode}: {config:?}");

        let handle = std::thread::spawn(move || {
            let _token = token;
            let mut slot = model.lock();
            let model = slot.as_mut().ok_or(AdapterError::NotLoaded(mode))?;
            model.apply_config(&config).map_err(|e| {
                log::warn!("Failed to reconfigure {mode}: {e}");
                AdapterError::Runtime(e)
            })?;
            log::info!("{mode} reconfigured");
            Ok(())
        });

        Ok(Reconfiguration { handle })
    }

    fn is_busy(&self) -> bool {
        self.guard.is_set()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detection::domain::detection_result::{BoundingBox, Category, Detection};
    use crossbeam_channel::Receiver;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    pub(crate) fn person_result() -> DetectionResult {
        DetectionResult::Objects(vec![Detection {
            bounding_box: Some(BoundingBox::new(10.0, 20.0, 100.0, 200.0)),
            categories: vec![Category::new(0, 0.9, "person")],
            keypoints: Vec::new(),
        }])
    }

    /// Detector returning a canned result and counting calls.
    pub(crate) struct FakeModel {
        result: DetectionResult,
        infer_calls: Arc<AtomicUsize>,
        applied: Arc<Mutex<Vec<AdapterConfig>>>,
        gate: Option<Receiver<()>>,
        fail_infer: bool,
        fail_apply: bool,
    }

    impl VisionModel for FakeModel {
        fn infer(
            &mut self,
            _frame: &Frame,
            _timestamp_ms: u64,
        ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
            self.infer_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_infer {
                return Err("inference failed".into());
            }
            Ok(self.result.clone())
        }

        fn apply_config(
            &mut self,
            config: &AdapterConfig,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            if self.fail_apply {
                return Err("apply failed".into());
            }
            self.applied.lock().push(config.clone());
            Ok(())
        }
    }

    /// Runtime building [`FakeModel`]s; modes listed in `failing` fail to load.
    #[derive(Default)]
    pub(crate) struct FakeRuntime {
        pub failing: Vec<DetectionMode>,
        pub results: HashMap<DetectionMode, DetectionResult>,
        pub infer_calls: Arc<AtomicUsize>,
        pub applied: Arc<Mutex<Vec<AdapterConfig>>>,
        pub gate: Option<Receiver<()>>,
        pub fail_infer: bool,
        pub fail_apply: bool,
    }

    impl VisionRuntime for FakeRuntime {
        fn create_model(
            &self,
            mode: DetectionMode,
            _config: &AdapterConfig,
        ) -> Result<Box<dyn VisionModel>, AdapterError> {
            if self.failing.contains(&mode) {
                return Err(AdapterError::Runtime("model fetch failed".into()));
            }
            let result = self
                .results
                .get(&mode)
                .cloned()
                .unwrap_or(DetectionResult::Objects(Vec::new()));
            Ok(Box::new(FakeModel {
                result,
                infer_calls: Arc::clone(&self.infer_calls),
                applied: Arc::clone(&self.applied),
                gate: self.gate.clone(),
                fail_infer: self.fail_infer,
                fail_apply: self.fail_apply,
            }))
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 4 * 4 * 3], 4, 4, 0)
    }

    #[test]
    fn test_load_success_and_failure() {
        let runtime = FakeRuntime {
            failing: vec![DetectionMode::Face],
            ..Default::default()
        };
        let mut object = VisionAdapter::object();
        let mut face = VisionAdapter::face();

        let ok = object.load(&runtime);
        let failed = face.load(&runtime);

        assert!(ok.load_result);
        assert!(object.is_loaded());
        assert!(!failed.load_result);
        assert_eq!(failed.mode, DetectionMode::Face);
        assert!(!face.is_loaded());
    }

    #[test]
    fn test_detect_returns_model_output() {
        let mut runtime = FakeRuntime::default();
        runtime.results.insert(DetectionMode::Object, person_result());
        let mut adapter = VisionAdapter::object();
        adapter.load(&runtime);

        let result = adapter.detect(&frame()).unwrap();

        assert_eq!(result, person_result());
        assert_eq!(runtime.infer_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detect_failure_yields_none() {
        let runtime = FakeRuntime {
            fail_infer: true,
            ..Default::default()
        };
        let mut adapter = VisionAdapter::object();
        adapter.load(&runtime);
        assert!(adapter.detect(&frame()).is_none());
    }

    #[test]
    fn test_detect_without_model_yields_none() {
        let mut adapter = VisionAdapter::gesture();
        assert!(adapter.detect(&frame()).is_none());
    }

    #[test]
    fn test_setters_change_config_only() {
        let runtime = FakeRuntime::default();
        let mut adapter = VisionAdapter::object();
        adapter.load(&runtime);

        adapter.set_score_threshold(0.3);
        adapter.set_max_results(3);
        adapter.set_delegate(Delegate::Cpu);
        adapter.set_running_mode(RunningMode::Image);

        assert_eq!(adapter.config().max_results, 3);
        assert_eq!(adapter.config().delegate, Delegate::Cpu);
        assert!(runtime.applied.lock().is_empty());
    }

    #[test]
    fn test_reset_config_restores_mode_defaults() {
        let mut adapter = VisionAdapter::object();
        adapter.set_score_threshold(0.2);
        adapter.set_max_results(9);
        adapter.set_delegate(Delegate::Cpu);

        adapter.reset_config();

        assert_eq!(
            adapter.config(),
            &AdapterConfig::for_mode(DetectionMode::Object)
        );
    }

    #[test]
    fn test_update_config_applies_snapshot() {
        let runtime = FakeRuntime::default();
        let mut adapter = VisionAdapter::object();
        adapter.load(&runtime);
        adapter.set_max_results(7);

        adapter.update_config().unwrap().wait().unwrap();

        assert_eq!(runtime.applied.lock()[0].max_results, 7);
        assert!(!adapter.is_busy());
    }

    #[test]
    fn test_second_update_while_in_flight_is_rejected() {
        let (release, gate) = crossbeam_channel::unbounded();
        let runtime = FakeRuntime {
            gate: Some(gate),
            ..Default::default()
        };
        let mut adapter = VisionAdapter::object();
        adapter.load(&runtime);

        let first = adapter.update_config().unwrap();
        assert!(adapter.is_busy());
        let second = adapter.update_config();
        assert!(matches!(
            second,
            Err(AdapterError::ReconfigureInFlight(DetectionMode::Object))
        ));

        release.send(()).unwrap();
        first.wait().unwrap();
        assert!(!adapter.is_busy());
        assert_eq!(runtime.applied.lock().len(), 1);
    }

    #[test]
    fn test_failed_update_releases_busy_flag() {
        let runtime = FakeRuntime {
            fail_apply: true,
            ..Default::default()
        };
        let mut adapter = VisionAdapter::face();
        adapter.load(&runtime);

        let err = adapter.update_config().unwrap().wait();

        assert!(matches!(err, Err(AdapterError::Runtime(_))));
        assert!(!adapter.is_busy());
        assert!(adapter.update_config().is_ok());
    }

    #[test]
    fn test_update_before_load_is_rejected() {
        let mut adapter = VisionAdapter::object();
        assert!(matches!(
            adapter.update_config(),
            Err(AdapterError::NotLoaded(DetectionMode::Object))
        ));
    }

    #[test]
    fn test_guard_token_releases_on_drop() {
        let guard = ReconfigureGuard::new();
        let token = guard.try_begin().unwrap();
        assert!(guard.try_begin().is_none());
        drop(token);
        assert!(!guard.is_set());
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn test_all_adapters_in_startup_order() {
        let modes: Vec<_> = VisionAdapter::all().iter().map(|a| a.mode()).collect();
        assert_eq!(modes, DetectionMode::ADAPTERS);
    }
}
