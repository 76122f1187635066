use std::collections::HashMap;
use std::time::Instant;

use crate::detection::domain::detection_mode::DetectionMode;
use crate::detection::domain::model_adapter::ModelAdapter;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::frame::Frame;

use super::loop_logger::LoopLogger;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No frame from the capture source yet.
    NotReady,
    /// Mode is `None` or its adapter is not loaded.
    Idle,
    /// The active adapter is being reconfigured; the frame was dropped.
    Busy,
    /// Detection failed; the previous overlay stays.
    NoResult,
    Drawn { mode: DetectionMode, items: usize },
}

/// Model adapters keyed by the mode they serve.
pub struct AdapterRegistry {
    adapters: HashMap<DetectionMode, Box<dyn ModelAdapter>>,
}

impl AdapterRegistry {
    /// Later adapters replace earlier ones registered for the same mode.
    pub fn new(adapters: Vec<Box<dyn ModelAdapter>>) -> Self {
        let adapters = adapters.into_iter().map(|a| (a.mode(), a)).collect();
        Self { adapters }
    }

    pub fn get(&self, mode: DetectionMode) -> Option<&dyn ModelAdapter> {
        self.adapters.get(&mode).map(|a| a.as_ref())
    }

    pub fn get_mut(&mut self, mode: DetectionMode) -> Option<&mut (dyn ModelAdapter + 'static)> {
        self.adapters.get_mut(&mode).map(|a| a.as_mut())
    }

    /// Registered modes in startup order.
    pub fn modes(&self) -> Vec<DetectionMode> {
        DetectionMode::ADAPTERS
            .iter()
            .copied()
            .filter(|m| self.adapters.contains_key(m))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Runs one detect + draw pass for `mode` on `frame`.
///
/// The camera is resized to the frame before drawing so overlay
/// coordinates stay in frame pixels.
pub fn run_tick(
    adapters: &mut AdapterRegistry,
    mode: DetectionMode,
    frame: Option<Frame>,
    surface: &mut RenderSurface,
    mirrored: bool,
    logger: &mut dyn LoopLogger,
) -> TickOutcome {
    let Some(frame) = frame else {
        return TickOutcome::NotReady;
    };
    let Some(adapter) = adapters.get_mut(mode).filter(|a| a.is_loaded()) else {
        return TickOutcome::Idle;
    };
    if adapter.is_busy() {
        log::trace!("{mode} is reconfiguring, skipping frame {}", frame.index());
        return TickOutcome::Busy;
    }

    let t0 = Instant::now();
    let result = adapter.detect(&frame);
    logger.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
    let Some(result) = result else {
        return TickOutcome::NoResult;
    };

    let (width, height) = (frame.width(), frame.height());
    let t0 = Instant::now();
    surface.resize_camera(width, height);
    surface.set_background(&frame, mirrored);
    adapter.draw(surface, mirrored, &result, width, height);
    logger.timing("draw", t0.elapsed().as_secs_f64() * 1000.0);

    let items = result.item_count();
    logger.metric("items", items as f64);
    log::debug!("Frame {}: {items} {mode} item(s)", frame.index());
    TickOutcome::Drawn { mode, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::model_adapter::tests::{person_result, FakeRuntime};
    use crate::detection::domain::model_adapter::VisionAdapter;
    use crate::pipeline::loop_logger::NullLoopLogger;
    use crate::rendering::domain::render_surface::tests::RecordingTarget;

    fn frame() -> Frame {
        Frame::new(vec![0; 64 * 48 * 3], 64, 48, 3)
    }

    fn loaded_registry(runtime: &FakeRuntime) -> AdapterRegistry {
        let mut registry = AdapterRegistry::new(VisionAdapter::all());
        for mode in registry.modes() {
            if let Some(adapter) = registry.get_mut(mode) {
                adapter.load(runtime);
            }
        }
        registry
    }

    fn surface() -> (RenderSurface, RecordingTarget) {
        let target = RecordingTarget::default();
        let mut surface = RenderSurface::new();
        surface.init_renderer(Box::new(target.clone()));
        surface.init_scene(1280, 720);
        (surface, target)
    }

    #[test]
    fn test_registry_keys_adapters_by_mode() {
        let registry = AdapterRegistry::new(VisionAdapter::all());
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.modes(), DetectionMode::ADAPTERS.to_vec());
        assert!(registry.get(DetectionMode::None).is_none());
        assert_eq!(
            registry.get(DetectionMode::Gesture).unwrap().mode(),
            DetectionMode::Gesture
        );
    }

    #[test]
    fn test_missing_frame_is_not_ready() {
        let runtime = FakeRuntime::default();
        let mut registry = loaded_registry(&runtime);
        let (mut surface, target) = surface();

        let outcome = run_tick(
            &mut registry,
            DetectionMode::Object,
            None,
            &mut surface,
            false,
            &mut NullLoopLogger,
        );

        assert_eq!(outcome, TickOutcome::NotReady);
        assert!(target.renders.lock().is_empty());
    }

    #[test]
    fn test_drawn_tick_resizes_camera_to_frame() {
        let mut runtime = FakeRuntime::default();
        runtime.results.insert(DetectionMode::Object, person_result());
        let mut registry = loaded_registry(&runtime);
        let (mut surface, target) = surface();

        let outcome = run_tick(
            &mut registry,
            DetectionMode::Object,
            Some(frame()),
            &mut surface,
            true,
            &mut NullLoopLogger,
        );

        assert_eq!(
            outcome,
            TickOutcome::Drawn {
                mode: DetectionMode::Object,
                items: 1
            }
        );
        assert_eq!(surface.camera_right(), 32.0);
        assert_eq!(surface.camera_top(), 24.0);
        assert_eq!(*target.backgrounds.lock(), vec![(3, true)]);
        assert_eq!(target.renders.lock().len(), 1);
    }

    #[test]
    fn test_unloaded_adapter_is_idle() {
        let runtime = FakeRuntime {
            failing: vec![DetectionMode::Face],
            ..Default::default()
        };
        let mut registry = loaded_registry(&runtime);
        let (mut surface, target) = surface();

        let outcome = run_tick(
            &mut registry,
            DetectionMode::Face,
            Some(frame()),
            &mut surface,
            false,
            &mut NullLoopLogger,
        );

        assert_eq!(outcome, TickOutcome::Idle);
        assert!(target.renders.lock().is_empty());
    }

    #[test]
    fn test_failed_detection_draws_nothing() {
        let runtime = FakeRuntime {
            fail_infer: true,
            ..Default::default()
        };
        let mut registry = loaded_registry(&runtime);
        let (mut surface, target) = surface();

        let outcome = run_tick(
            &mut registry,
            DetectionMode::Object,
            Some(frame()),
            &mut surface,
            false,
            &mut NullLoopLogger,
        );

        assert_eq!(outcome, TickOutcome::NoResult);
        assert!(target.renders.lock().is_empty());
    }
}
