use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::pipeline::overlay_controller::OverlayController;

/// Drives [`OverlayController::tick`] on a fixed timer.
///
/// The interval is re-read from the controller before every tick, so
/// `set_delay(None)` ends the loop and a new delay takes effect at once.
/// Ticks run on the calling thread and are never interrupted.
pub struct IntervalDriver {
    cancelled: Arc<AtomicBool>,
    max_ticks: Option<usize>,
}

impl IntervalDriver {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            max_ticks: None,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<usize>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Flag that stops the loop before its next tick when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Runs until cancelled, the delay is cleared, the tick limit is hit or
    /// the capture source ends. Returns the number of ticks run.
    pub fn run(&self, controller: &mut OverlayController) -> usize {
        let mut ticker: Option<(Duration, Receiver<std::time::Instant>)> = None;
        let mut ticks = 0usize;

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("Loop cancelled after {ticks} ticks");
                break;
            }
            let Some(delay) = controller.delay() else {
                log::info!("Loop stopped after {ticks} ticks");
                break;
            };
            if ticker.as_ref().map(|(d, _)| *d) != Some(delay) {
                log::debug!("Tick interval set to {}ms", delay.as_millis());
                ticker = Some((delay, crossbeam_channel::tick(delay)));
            }
            if let Some((_, rx)) = &ticker {
                if rx.recv().is_err() {
                    break;
                }
            }
            if self.cancelled.load(Ordering::Relaxed) {
                continue;
            }

            let outcome = controller.tick();
            ticks += 1;
            log::trace!("Tick {ticks}: {outcome:?}");

            if self.max_ticks.is_some_and(|max| ticks >= max) {
                log::info!("Reached tick limit ({ticks})");
                break;
            }
            // An ended source keeps its last frame, so the outcome alone
            // cannot tell that playback is over.
            if !controller.has_running_source() {
                log::info!("Capture source ended after {ticks} ticks");
                break;
            }
        }
        ticks
    }
}

impl Default for IntervalDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_source::{CaptureSource, FrameSlot};
    use crate::detection::domain::model_adapter::tests::FakeRuntime;
    use crate::detection::domain::model_adapter::VisionAdapter;
    use crate::rendering::domain::render_surface::RenderSurface;
    use crate::shared::frame::Frame;

    struct SlotSource {
        slot: FrameSlot,
        running: bool,
    }

    impl CaptureSource for SlotSource {
        fn latest_frame(&self) -> Option<Frame> {
            self.slot.latest()
        }

        fn resolution(&self) -> Option<(u32, u32)> {
            None
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn stop(&mut self) {
            self.running = false;
        }
    }

    fn controller(frame: bool, running: bool) -> OverlayController {
        let slot = FrameSlot::new();
        if frame {
            slot.publish(Frame::new(vec![0; 8 * 8 * 3], 8, 8, 0));
        }
        let mut controller = OverlayController::new(VisionAdapter::all(), RenderSurface::new());
        controller.init_models(&FakeRuntime::default());
        controller.attach_source(Box::new(SlotSource { slot, running }));
        controller.set_delay(Some(Duration::from_millis(1)));
        controller
    }

    #[test]
    fn test_stops_at_tick_limit() {
        let mut controller = controller(true, true);
        let driver = IntervalDriver::new().with_max_ticks(Some(3));
        assert_eq!(driver.run(&mut controller), 3);
        assert_eq!(controller.ticks(), 3);
    }

    #[test]
    fn test_cleared_delay_runs_nothing() {
        let mut controller = controller(true, true);
        controller.set_delay(None);
        assert_eq!(IntervalDriver::new().run(&mut controller), 0);
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let mut controller = controller(true, true);
        let driver = IntervalDriver::new();
        driver.cancel_handle().store(true, Ordering::Relaxed);
        assert_eq!(driver.run(&mut controller), 0);
    }

    #[test]
    fn test_ended_source_stops_the_loop() {
        let mut controller = controller(false, false);
        let driver = IntervalDriver::new().with_max_ticks(Some(50));
        assert_eq!(driver.run(&mut controller), 1);
    }

    #[test]
    fn test_ended_source_with_last_frame_stops_the_loop() {
        let mut controller = controller(true, false);
        let driver = IntervalDriver::new().with_max_ticks(Some(50));
        assert_eq!(driver.run(&mut controller), 1);
        assert_eq!(controller.ticks(), 1);
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let mut controller = controller(true, true);
        let driver = IntervalDriver::new();
        let cancel = driver.cancel_handle();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            cancel.store(true, Ordering::Relaxed);
        });
        let ticks = driver.run(&mut controller);
        stopper.join().unwrap();
        assert!(ticks > 0);
    }
}
