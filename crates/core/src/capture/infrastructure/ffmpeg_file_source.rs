use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_source::{CaptureSource, FrameSlot};
use crate::shared::frame::Frame;

const FALLBACK_FPS: f64 = 30.0;

/// Plays a video file as if it were a camera.
///
/// Frames are decoded via ffmpeg-next on a background thread and published
/// at the file's frame rate. The source stops at end of file and keeps
/// its last frame.
pub struct FfmpegFileSource {
    slot: FrameSlot,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    resolution: (u32, u32),
    fps: f64,
}

impl FfmpegFileSource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let slot = FrameSlot::new();
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread_path = path.to_path_buf();
        let thread_slot = slot.clone();
        let thread_running = running.clone();
        let thread_handle = std::thread::Builder::new()
            .name("file-capture".to_string())
            .spawn(move || playback_thread(thread_path, thread_slot, thread_running, ready_tx))
            .map_err(|e| CaptureError::Open(format!("failed to spawn playback thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok((width, height, fps))) => {
                log::info!(
                    "Opened {} ({width}x{height} @ {fps:.1} fps)",
                    path.display()
                );
                Ok(Self {
                    slot,
                    running,
                    thread_handle: Some(thread_handle),
                    resolution: (width, height),
                    fps,
                })
            }
            Ok(Err(message)) => {
                let _ = thread_handle.join();
                Err(CaptureError::Open(message))
            }
            Err(_) => {
                let _ = thread_handle.join();
                Err(CaptureError::Open(format!(
                    "playback thread exited opening {}",
                    path.display()
                )))
            }
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

fn playback_thread(
    path: PathBuf,
    slot: FrameSlot,
    running: Arc<AtomicBool>,
    ready_tx: crossbeam_channel::Sender<Result<(u32, u32, f64), String>>,
) {
    let mut decoder = match FileDecoder::open(&path) {
        Ok(decoder) => decoder,
        Err(e) => {
            running.store(false, Ordering::Release);
            let _ = ready_tx.send(Err(format!("{}: {e}", path.display())));
            return;
        }
    };
    let _ = ready_tx.send(Ok((decoder.width, decoder.height, decoder.fps)));

    let period = Duration::from_secs_f64(1.0 / decoder.fps);
    let mut deadline = Instant::now();
    while running.load(Ordering::Acquire) {
        match decoder.next_frame() {
            Ok(Some(frame)) => slot.publish(frame),
            Ok(None) => {
                log::info!("Reached end of {}", path.display());
                break;
            }
            Err(e) => {
                log::warn!("Decoding {} failed: {e}", path.display());
                break;
            }
        }
        deadline += period;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
    running.store(false, Ordering::Release);
}

/// Sequential decoder over the best video stream of a file.
struct FileDecoder {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    fps: f64,
    frame_index: usize,
    eof: bool,
}

impl FileDecoder {
    fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 && rate.numerator() > 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            FALLBACK_FPS
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            fps,
            frame_index: 0,
            eof: false,
        })
    }

    /// Next decoded frame, or `None` once the decoder is drained.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        loop {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
                self.scaler.run(&decoded, &mut rgb_frame)?;
                let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
                let frame = Frame::new(pixels, self.width, self.height, self.frame_index);
                self.frame_index += 1;
                return Ok(Some(frame));
            }
            if self.eof {
                return Ok(None);
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    self.decoder.send_eof()?;
                    self.eof = true;
                }
            }
        }
    }
}

/// Copies pixel data into a tightly packed RGB buffer, dropping row padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * Frame::CHANNELS;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}

impl CaptureSource for FfmpegFileSource {
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

impl Drop for FfmpegFileSource {
    fn drop(&mut self) {
        self.stop();
    }
}
