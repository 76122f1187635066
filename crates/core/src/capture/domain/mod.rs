pub mod camera_alert;
pub mod camera_devices;
pub mod capture_error;
pub mod capture_source;
