use super::camera_devices::CameraStatus;

/// Raises a camera alert once per transition into a failure status.
///
/// Statuses seen while models are still loading are held back, so the
/// alert fires on the first observation after loading completes.
#[derive(Debug, Default)]
pub struct CameraAlert {
    last: Option<CameraStatus>,
}

impl CameraAlert {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the message to show, if this observation should alert.
    pub fn observe(&mut self, status: CameraStatus, loading: bool) -> Option<&'static str> {
        if loading || self.last == Some(status) {
            return None;
        }
        self.last = Some(status);
        status.alert_message()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
