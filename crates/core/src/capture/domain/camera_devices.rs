use crate::shared::constants::{
    ERROR_ENABLE_CAMERA_PERMISSION_MSG, ERROR_NO_CAMERA_DEVICE_AVAILABLE_MSG,
};

use super::capture_error::CaptureError;

/// A video input the user can pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub name: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Outcome of asking the platform for cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraStatus {
    Success,
    PermissionError,
    NoDevices,
}

impl CameraStatus {
    /// User-facing message for failure statuses.
    pub fn alert_message(self) -> Option<&'static str> {
        match self {
            CameraStatus::Success => None,
            CameraStatus::PermissionError => Some(ERROR_ENABLE_CAMERA_PERMISSION_MSG),
            CameraStatus::NoDevices => Some(ERROR_NO_CAMERA_DEVICE_AVAILABLE_MSG),
        }
    }
}

/// Lists the video inputs the platform exposes.
pub trait DeviceEnumerator {
    fn enumerate(&self) -> Result<Vec<CameraDevice>, CaptureError>;
}

/// Device list, status and current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraDevicesState {
    pub devices: Vec<CameraDevice>,
    pub status: CameraStatus,
    pub selected: Option<String>,
}

impl CameraDevicesState {
    /// The first device is selected when any are found.
    pub fn from_enumeration(result: Result<Vec<CameraDevice>, CaptureError>) -> Self {
        match result {
            Ok(devices) if devices.is_empty() => Self::failed(CameraStatus::NoDevices),
            Ok(devices) => Self {
                selected: devices.first().map(|d| d.id.clone()),
                devices,
                status: CameraStatus::Success,
            },
            Err(CaptureError::PermissionDenied(msg)) => {
                log::warn!("Camera permission denied: {msg}");
                Self::failed(CameraStatus::PermissionError)
            }
            Err(e) => {
                log::warn!("Camera enumeration failed: {e}");
                Self::failed(CameraStatus::NoDevices)
            }
        }
    }

    pub fn query(enumerator: &dyn DeviceEnumerator) -> Self {
        Self::from_enumeration(enumerator.enumerate())
    }

    fn failed(status: CameraStatus) -> Self {
        Self {
            devices: Vec::new(),
            status,
            selected: None,
        }
    }

    /// Selects a device by id, falling back to an exact name match.
    pub fn select(&mut self, key: &str) -> Result<&CameraDevice, CaptureError> {
        let device = self
            .devices
            .iter()
            .find(|d| d.id == key)
            .or_else(|| self.devices.iter().find(|d| d.name == key))
            .ok_or_else(|| CaptureError::UnknownDevice(key.to_string()))?;
        self.selected = Some(device.id.clone());
        Ok(device)
    }

    pub fn selected_device(&self) -> Option<&CameraDevice> {
        let id = self.selected.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }
}
