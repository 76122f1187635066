use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

use super::image_writer::ImageWriter;
use super::video_writer::VideoWriter;

/// Destination for composited overlay frames.
pub trait OverlaySink: Send {
    fn accept(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Finalizes output and returns the number of frames kept.
    fn finish(&mut self) -> Result<usize, Box<dyn std::error::Error>>;
}

/// Records every frame to a video file.
///
/// The writer is opened on the first frame, since the live stream's
/// resolution is not known up front. Frames with a different size are
/// dropped.
pub struct VideoSink {
    writer: Box<dyn VideoWriter>,
    path: PathBuf,
    fps: f64,
    size: Option<(u32, u32)>,
    written: usize,
}

impl VideoSink {
    pub fn new(writer: Box<dyn VideoWriter>, path: &Path, fps: f64) -> Self {
        Self {
            writer,
            path: path.to_path_buf(),
            fps,
            size: None,
            written: 0,
        }
    }
}

impl OverlaySink for VideoSink {
    fn accept(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let dims = (frame.width(), frame.height());
        match self.size {
            None => {
                let metadata = VideoMetadata {
                    width: dims.0,
                    height: dims.1,
                    fps: self.fps,
                    source_path: None,
                };
                self.writer.open(&self.path, &metadata)?;
                self.size = Some(dims);
                log::info!(
                    "Recording {}x{} overlay to {}",
                    dims.0,
                    dims.1,
                    self.path.display()
                );
            }
            Some(size) if size != dims => {
                log::warn!(
                    "Dropping {}x{} frame from {}x{} recording",
                    dims.0,
                    dims.1,
                    size.0,
                    size.1
                );
                return Ok(());
            }
            Some(_) => {}
        }
        self.writer.write(frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<usize, Box<dyn std::error::Error>> {
        if self.size.take().is_some() {
            self.writer.close()?;
        }
        Ok(self.written)
    }
}

/// Keeps only the latest frame and writes it as an image on finish.
pub struct SnapshotSink {
    writer: Box<dyn ImageWriter>,
    path: PathBuf,
    latest: Option<Frame>,
}

impl SnapshotSink {
    pub fn new(writer: Box<dyn ImageWriter>, path: &Path) -> Self {
        Self {
            writer,
            path: path.to_path_buf(),
            latest: None,
        }
    }
}

impl OverlaySink for SnapshotSink {
    fn accept(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.latest = Some(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<usize, Box<dyn std::error::Error>> {
        match self.latest.take() {
            Some(frame) => {
                self.writer.write(&self.path, &frame)?;
                log::info!("Saved snapshot to {}", self.path.display());
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    pub(crate) struct MemoryVideoWriter {
        pub opened: Arc<Mutex<Vec<VideoMetadata>>>,
        pub frames: Arc<Mutex<Vec<usize>>>,
        pub closed: Arc<Mutex<usize>>,
    }

    impl VideoWriter for MemoryVideoWriter {
        fn open(
            &mut self,
            _path: &Path,
            metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.opened.lock().push(metadata.clone());
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.frames.lock().push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock() += 1;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryImageWriter {
        saved: Arc<Mutex<Vec<(PathBuf, usize)>>>,
    }

    impl ImageWriter for MemoryImageWriter {
        fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.saved.lock().push((path.to_path_buf(), frame.index()));
            Ok(())
        }
    }

    fn frame(w: u32, h: u32, index: usize) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, index)
    }

    #[test]
    fn test_video_sink_opens_on_first_frame() {
        let writer = MemoryVideoWriter::default();
        let mut sink = VideoSink::new(Box::new(writer.clone()), Path::new("out.mp4"), 6.0);

        assert!(writer.opened.lock().is_empty());
        sink.accept(&frame(4, 2, 0)).unwrap();
        sink.accept(&frame(4, 2, 1)).unwrap();

        let opened = writer.opened.lock();
        assert_eq!(opened.len(), 1);
        assert_eq!((opened[0].width, opened[0].height), (4, 2));
        assert_eq!(*writer.frames.lock(), vec![0, 1]);
    }

    #[test]
    fn test_video_sink_drops_resized_frames() {
        let writer = MemoryVideoWriter::default();
        let mut sink = VideoSink::new(Box::new(writer.clone()), Path::new("out.mp4"), 6.0);
        sink.accept(&frame(4, 2, 0)).unwrap();
        sink.accept(&frame(2, 2, 1)).unwrap();
        assert_eq!(sink.finish().unwrap(), 1);
        assert_eq!(*writer.closed.lock(), 1);
    }

    #[test]
    fn test_video_sink_without_frames_never_opens() {
        let writer = MemoryVideoWriter::default();
        let mut sink = VideoSink::new(Box::new(writer.clone()), Path::new("out.mp4"), 6.0);
        assert_eq!(sink.finish().unwrap(), 0);
        assert_eq!(*writer.closed.lock(), 0);
    }

    #[test]
    fn test_snapshot_sink_writes_latest_frame() {
        let writer = MemoryImageWriter::default();
        let mut sink = SnapshotSink::new(Box::new(writer.clone()), Path::new("shot.png"));
        sink.accept(&frame(2, 2, 3)).unwrap();
        sink.accept(&frame(2, 2, 4)).unwrap();

        assert_eq!(sink.finish().unwrap(), 1);
        assert_eq!(
            *writer.saved.lock(),
            vec![(PathBuf::from("shot.png"), 4)]
        );
    }

    #[test]
    fn test_snapshot_sink_without_frames_writes_nothing() {
        let writer = MemoryImageWriter::default();
        let mut sink = SnapshotSink::new(Box::new(writer.clone()), Path::new("shot.png"));
        assert_eq!(sink.finish().unwrap(), 0);
        assert!(writer.saved.lock().is_empty());
    }
}
