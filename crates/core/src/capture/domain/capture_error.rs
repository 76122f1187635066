use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("no camera device available")]
    NoDevice,

    #[error("unknown camera device: {0}")]
    UnknownDevice(String),

    #[error("failed to open capture source: {0}")]
    Open(String),

    #[error("capture stream failed: {0}")]
    Stream(String),
}
