use std::path::Path;

use crate::shared::frame::Frame;

/// Saves a single frame as an image (screenshot).
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
