use std::sync::Arc;

use parking_lot::Mutex;

use crate::shared::frame::Frame;

/// A live frame producer polled by the frame loop.
///
/// Sources decode on their own thread and only expose the most recent
/// frame; the loop never queues frames.
pub trait CaptureSource: Send {
    /// The newest frame, or `None` until the first one has arrived.
    fn latest_frame(&self) -> Option<Frame>;

    /// Native resolution of the stream, once known.
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Whether the producer thread is still delivering frames.
    fn is_running(&self) -> bool;

    /// Stops the producer thread. Safe to call more than once.
    fn stop(&mut self);
}

/// Single-slot handoff between a capture thread and the loop thread.
///
/// Publishing overwrites the previous frame.
#[derive(Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<Option<Frame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty frames are ignored so readers only ever see drawable data.
    pub fn publish(&self, frame: Frame) {
        if frame.is_empty() {
            return;
        }
        *self.inner.lock() = Some(frame);
    }

    pub fn latest(&self) -> Option<Frame> {
        self.inner.lock().clone()
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}
