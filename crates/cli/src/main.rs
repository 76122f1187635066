mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use live_vision_core::capture::domain::camera_devices::{
    CameraDevice, CameraDevicesState, CameraStatus,
};
use live_vision_core::capture::domain::capture_error::CaptureError;
use live_vision_core::capture::domain::capture_source::CaptureSource;
use live_vision_core::capture::infrastructure::ffmpeg_file_source::FfmpegFileSource;
use live_vision_core::capture::infrastructure::nokhwa_camera::{
    NokhwaCamera, NokhwaDeviceEnumerator,
};
use live_vision_core::detection::domain::adapter_config::{
    Delegate, FaceMeshDrawingMode, RunningMode,
};
use live_vision_core::detection::domain::detection_mode::DetectionMode;
use live_vision_core::detection::domain::model_adapter::VisionAdapter;
use live_vision_core::detection::infrastructure::onnx_vision_runtime::OnnxVisionRuntime;
use live_vision_core::pipeline::infrastructure::interval_driver::IntervalDriver;
use live_vision_core::pipeline::loop_logger::StdoutLoopLogger;
use live_vision_core::pipeline::overlay_controller::{ModelSettings, OverlayController};
use live_vision_core::rendering::domain::render_surface::RenderSurface;
use live_vision_core::rendering::infrastructure::frame_rasterizer::FrameRasterizer;
use live_vision_core::shared::constants::{
    DEFAULT_LOOP_INTERVAL, DEFAULT_SCENE_HEIGHT, DEFAULT_SCENE_WIDTH,
};
use live_vision_core::shared::model_resolver::ModelResolver;
use live_vision_core::shared::video_metadata::VideoMetadata;
use live_vision_core::video::infrastructure::overlay_recorder::{
    sink_for_path, OverlayRecorder, DEFAULT_RECORDER_CAPACITY,
};

use settings::SettingsFile;

/// Live object, face, gesture and face-landmark overlays on a camera feed.
#[derive(Parser)]
#[command(name = "live-vision")]
struct Cli {
    /// Camera to open, by id or name (default: first camera).
    #[arg(long, conflicts_with = "input")]
    device: Option<String>,

    /// Play a video file instead of opening a camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// List cameras and exit.
    #[arg(long)]
    list_devices: bool,

    /// Detection mode: object, face, gesture, landmark, none, or 0-3.
    #[arg(long)]
    mode: Option<DetectionMode>,

    /// Mirror the preview and overlay horizontally.
    #[arg(long)]
    mirrored: bool,

    /// Score threshold for the active mode (0.0-1.0).
    #[arg(long)]
    score_threshold: Option<f32>,

    /// Maximum results for the active mode (0 = unlimited for objects).
    #[arg(long)]
    max_results: Option<usize>,

    /// Compute delegate: cpu or gpu.
    #[arg(long)]
    delegate: Option<Delegate>,

    /// Running mode: image or video.
    #[arg(long)]
    running_mode: Option<RunningMode>,

    /// Face mesh drawing: tesselation, points or face_oval.
    #[arg(long)]
    drawing_mode: Option<FaceMeshDrawingMode>,

    /// Milliseconds between loop ticks.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Record the overlay to a video file, or save the last frame for
    /// image extensions.
    #[arg(long)]
    output: Option<PathBuf>,

    /// TrueType/OpenType font for labels.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory searched for model files before downloading.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Stop after this many ticks.
    #[arg(long)]
    max_ticks: Option<usize>,

    /// JSON settings file; flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            score_threshold: self.score_threshold,
            max_results: self.max_results,
            delegate: self.delegate,
            running_mode: self.running_mode,
            drawing_mode: self.drawing_mode,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.list_devices {
        return list_devices();
    }

    let file = match &cli.config {
        Some(path) => SettingsFile::load(path)?,
        None => SettingsFile::default(),
    };
    let interval = cli
        .interval_ms
        .or(file.interval_ms)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_LOOP_INTERVAL);

    let (rasterizer, recorder) = build_rasterizer(&cli, interval)?;
    let mut surface = RenderSurface::new();
    surface.init_renderer(Box::new(rasterizer));
    surface.init_scene(DEFAULT_SCENE_WIDTH, DEFAULT_SCENE_HEIGHT);

    let mut controller = OverlayController::new(VisionAdapter::all(), surface)
        .with_logger(Box::new(StdoutLoopLogger::default()));

    // Without a camera there is nothing to run, so skip loading models.
    let source = open_source(&cli, &mut controller)?;
    controller.attach_source(source);

    let runtime = OnnxVisionRuntime::new(ModelResolver::with_default_cache(cli.model_dir.clone())?);
    if controller.init_models(&runtime).is_empty() {
        return Err("No detection model could be loaded".into());
    }

    if let Some(mode) = cli.mode.or(file.mode) {
        controller.set_mode(mode)?;
    }
    apply_settings(&mut controller, &file, &cli.model_settings());
    controller.set_mirrored(cli.mirrored || file.mirrored.unwrap_or(false));
    controller.set_delay(Some(interval));

    let driver = IntervalDriver::new().with_max_ticks(cli.max_ticks);
    watch_stdin(driver.cancel_handle());
    eprintln!(
        "Running {} every {}ms. Press Enter to stop.",
        controller.mode(),
        interval.as_millis()
    );
    driver.run(&mut controller);
    controller.shutdown();

    // The rasterizer's sender goes with the controller; the recorder then drains.
    drop(controller);
    if let (Some(recorder), Some(output)) = (recorder, &cli.output) {
        let frames = recorder.finish()?;
        log::info!("Wrote {frames} frame(s) to {}", output.display());
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if let Some(score) = cli.score_threshold {
        if !(0.0..=1.0).contains(&score) {
            return Err(format!("Score threshold must be between 0.0 and 1.0, got {score}").into());
        }
    }
    if cli.interval_ms == Some(0) {
        return Err("Interval must be at least 1ms".into());
    }
    if cli.max_ticks == Some(0) {
        return Err("--max-ticks must be positive".into());
    }
    if let Some(font) = &cli.font {
        if !font.exists() {
            return Err(format!("Font file not found: {}", font.display()).into());
        }
    }
    Ok(())
}

fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let state = CameraDevicesState::query(&NokhwaDeviceEnumerator);
    if let Some(message) = state.status.alert_message() {
        return Err(message.into());
    }
    for device in &state.devices {
        println!("{}\t{}", device.id, device.name);
    }
    Ok(())
}

fn build_rasterizer(
    cli: &Cli,
    interval: Duration,
) -> Result<(FrameRasterizer, Option<OverlayRecorder>), Box<dyn std::error::Error>> {
    let mut rasterizer = FrameRasterizer::new();
    if let Some(font) = &cli.font {
        rasterizer = rasterizer.with_font_file(font)?;
    }
    let Some(output) = &cli.output else {
        return Ok((rasterizer, None));
    };
    let fps = VideoMetadata::for_interval(0, 0, interval).fps;
    let (recorder, tx) = OverlayRecorder::spawn(sink_for_path(output, fps), DEFAULT_RECORDER_CAPACITY)?;
    Ok((rasterizer.with_output(tx), Some(recorder)))
}

/// Opens the file or camera and records the camera status on the
/// controller. A failed status comes back as the error, carrying the alert
/// text.
fn open_source(
    cli: &Cli,
    controller: &mut OverlayController,
) -> Result<Box<dyn CaptureSource>, Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        let source = FfmpegFileSource::open(input)?;
        controller.on_camera_status(CameraStatus::Success);
        return Ok(Box::new(source));
    }

    let mut state = CameraDevicesState::query(&NokhwaDeviceEnumerator);
    controller.on_camera_status(state.status);
    let device = select_device(&mut state, cli.device.as_deref())?;

    match NokhwaCamera::open(&device) {
        Ok(camera) => {
            controller.on_camera_status(CameraStatus::Success);
            Ok(Box::new(camera))
        }
        Err(CaptureError::PermissionDenied(msg)) => {
            controller.on_camera_status(CameraStatus::PermissionError);
            Err(format!("Camera permission denied: {msg}").into())
        }
        Err(e) => Err(e.into()),
    }
}

/// The camera to open, or the status alert when there is none.
fn select_device(
    state: &mut CameraDevicesState,
    key: Option<&str>,
) -> Result<CameraDevice, Box<dyn std::error::Error>> {
    if let Some(message) = state.status.alert_message() {
        return Err(message.into());
    }
    if let Some(key) = key {
        state.select(key)?;
    }
    state
        .selected_device()
        .cloned()
        .ok_or_else(|| "No camera selected".into())
}

/// Settings from the file apply per mode; flags apply to the active mode.
fn apply_settings(controller: &mut OverlayController, file: &SettingsFile, flags: &ModelSettings) {
    let active = controller.mode();
    for mode in DetectionMode::ADAPTERS.iter().copied() {
        if !controller.is_mode_available(mode) {
            continue;
        }
        let mut settings = file.for_mode(mode);
        if mode == active {
            settings = settings.merged(flags);
        }
        if settings.is_empty() {
            continue;
        }
        let applied = controller
            .apply_settings(mode, &settings)
            .map_err(|e| e.to_string())
            .and_then(|r| r.wait().map_err(|e| e.to_string()));
        if let Err(e) = applied {
            log::warn!("Could not apply {mode} settings: {e}");
        }
    }
}

/// Sets `cancel` when a line is read from stdin.
fn watch_stdin(cancel: Arc<AtomicBool>) {
    let spawned = std::thread::Builder::new()
        .name("stdin-watch".to_string())
        .spawn(move || {
            let mut line = String::new();
            if let Ok(n) = std::io::stdin().read_line(&mut line) {
                if n > 0 {
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Cannot watch stdin: {e}");
    }
}
