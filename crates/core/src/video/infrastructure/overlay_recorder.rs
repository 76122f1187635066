use std::path::Path;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::overlay_sink::{OverlaySink, SnapshotSink, VideoSink};

use super::ffmpeg_writer::FfmpegWriter;
use super::image_file_writer::ImageFileWriter;

pub const DEFAULT_RECORDER_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Picks a snapshot sink for image extensions and a video sink otherwise.
pub fn sink_for_path(path: &Path, fps: f64) -> Box<dyn OverlaySink> {
    let is_image = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);
    if is_image {
        Box::new(SnapshotSink::new(Box::new(ImageFileWriter::new()), path))
    } else {
        Box::new(VideoSink::new(Box::new(FfmpegWriter::new()), path, fps))
    }
}

/// Drains composited frames into an [`OverlaySink`] on its own thread.
///
/// The thread ends once every sender is dropped.
pub struct OverlayRecorder {
    handle: JoinHandle<Result<usize, SendError>>,
}

impl OverlayRecorder {
    /// Returns the recorder and the sender the rasterizer publishes into.
    pub fn spawn(
        sink: Box<dyn OverlaySink>,
        capacity: usize,
    ) -> Result<(Self, Sender<Frame>), Box<dyn std::error::Error>> {
        let (tx, rx) = crossbeam_channel::bounded::<Frame>(capacity.max(1));
        let handle = std::thread::Builder::new()
            .name("overlay-recorder".to_string())
            .spawn(move || record(sink, rx))?;
        Ok((Self { handle }, tx))
    }

    /// Waits for the queue to drain and returns the frames kept.
    pub fn finish(self) -> Result<usize, Box<dyn std::error::Error>> {
        match self.handle.join() {
            Ok(result) => result.map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() }),
            Err(_) => Err("overlay recorder thread panicked".into()),
        }
    }
}

fn record(mut sink: Box<dyn OverlaySink>, rx: Receiver<Frame>) -> Result<usize, SendError> {
    for frame in rx {
        if let Err(e) = sink.accept(&frame) {
            log::warn!("Recording stopped: {e}");
            return Err(e.to_string().into());
        }
    }
    sink.finish()
        .map_err(|e| -> SendError { e.to_string().into() })
}
