use thiserror::Error;

use crate::shared::frame::Frame;

use super::adapter_config::AdapterConfig;
use super::detection_mode::DetectionMode;
use super::detection_result::DetectionResult;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("{0} model is not loaded")]
    NotLoaded(DetectionMode),
    #[error("{0} is already being reconfigured")]
    ReconfigureInFlight(DetectionMode),
    #[error("no detector available for {0}")]
    Unsupported(DetectionMode),
    #[error(transparent)]
    Runtime(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain interface over one loaded detector.
///
/// Implementations hold an inference session and are called from one
/// thread at a time.
pub trait VisionModel: Send {
    /// Runs the detector on a frame. `timestamp_ms` increases monotonically
    /// in video running mode.
    fn infer(
        &mut self,
        frame: &Frame,
        timestamp_ms: u64,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>>;

    /// Applies new options to the live detector.
    fn apply_config(
        &mut self,
        config: &AdapterConfig,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Shared handle that builds detectors for each mode.
pub trait VisionRuntime: Send + Sync {
    fn create_model(
        &self,
        mode: DetectionMode,
        config: &AdapterConfig,
    ) -> Result<Box<dyn VisionModel>, AdapterError>;
}
