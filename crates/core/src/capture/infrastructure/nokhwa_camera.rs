//! Camera capture using the nokhwa crate.
//!
//! The camera is opened and read on a background thread; the loop thread
//! only sees the latest decoded frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::capture::domain::camera_devices::{CameraDevice, DeviceEnumerator};
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_source::{CaptureSource, FrameSlot};
use crate::shared::frame::Frame;

const OPEN_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Enumerates cameras through nokhwa's native backend.
pub struct NokhwaDeviceEnumerator;

impl DeviceEnumerator for NokhwaDeviceEnumerator {
    fn enumerate(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        let cameras =
            nokhwa::query(ApiBackend::Auto).map_err(|e| classify_error(&e.to_string()))?;
        Ok(cameras
            .iter()
            .map(|info| CameraDevice::new(info.index().to_string(), info.human_name()))
            .collect())
    }
}

/// Backends report authorization failures as plain strings.
fn classify_error(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("authoriz") {
        CaptureError::PermissionDenied(message.to_string())
    } else {
        CaptureError::Open(message.to_string())
    }
}

fn camera_index(id: &str) -> CameraIndex {
    id.parse::<u32>()
        .map(CameraIndex::Index)
        .unwrap_or_else(|_| CameraIndex::String(id.to_string()))
}

/// A live camera stream.
pub struct NokhwaCamera {
    slot: FrameSlot,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    resolution: (u32, u32),
}

impl NokhwaCamera {
    /// Opens `device` and blocks until the stream is running or has failed.
    pub fn open(device: &CameraDevice) -> Result<Self, CaptureError> {
        let slot = FrameSlot::new();
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let index = camera_index(&device.id);
        let thread_slot = slot.clone();
        let thread_running = running.clone();
        let thread_handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || capture_thread(index, thread_slot, thread_running, ready_tx))
            .map_err(|e| CaptureError::Open(format!("failed to spawn capture thread: {e}")))?;

        let opened = ready_rx
            .recv_timeout(OPEN_TIMEOUT)
            .map_err(|_| CaptureError::Open(format!("timed out opening {}", device.name)))
            .and_then(|r| r);

        match opened {
            Ok(resolution) => {
                log::info!(
                    "Camera opened: {} ({}x{})",
                    device.name,
                    resolution.0,
                    resolution.1
                );
                Ok(Self {
                    slot,
                    running,
                    thread_handle: Some(thread_handle),
                    resolution,
                })
            }
            Err(e) => {
                running.store(false, Ordering::Release);
                let _ = thread_handle.join();
                Err(e)
            }
        }
    }
}

/// Tries progressively looser format requests until one opens.
fn open_camera(index: &CameraIndex) -> Result<Camera, CaptureError> {
    let requests = [
        RequestedFormatType::AbsoluteHighestResolution,
        RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
        RequestedFormatType::None,
    ];
    let mut last_error = String::from("no format accepted");
    for request in requests {
        match Camera::new(index.clone(), RequestedFormat::new::<RgbFormat>(request)) {
            Ok(camera) => return Ok(camera),
            Err(e) => {
                log::debug!("Camera rejected format {request:?}: {e}");
                last_error = e.to_string();
            }
        }
    }
    Err(classify_error(&last_error))
}

fn capture_thread(
    index: CameraIndex,
    slot: FrameSlot,
    running: Arc<AtomicBool>,
    ready_tx: crossbeam_channel::Sender<Result<(u32, u32), CaptureError>>,
) {
    let mut camera = match open_camera(&index) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = ready_tx.send(Err(classify_error(&e.to_string())));
        return;
    }
    let res = camera.resolution();
    if ready_tx.send(Ok((res.width(), res.height()))).is_err() {
        return;
    }

    let mut frame_index = 0usize;
    while running.load(Ordering::Acquire) {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        match decoded {
            Ok(image) => {
                let (width, height) = (image.width(), image.height());
                slot.publish(Frame::new(image.into_raw(), width, height, frame_index));
                frame_index += 1;
            }
            Err(e) => {
                log::warn!("Failed to capture frame: {e}");
                std::thread::sleep(RETRY_DELAY);
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        log::debug!("Failed to stop camera stream: {e}");
    }
    log::info!("Camera capture thread stopped");
}

impl CaptureSource for NokhwaCamera {
    fn latest_frame(&self) -> Option<Frame> {
        self.slot.latest()
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        Some(self.resolution)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.stop();
    }
}
