use std::path::PathBuf;

/// Geometry and pacing of a frame stream, used to open recorders.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frame rate implied by a loop interval, used when recording a live camera.
    pub fn for_interval(width: u32, height: u32, interval: std::time::Duration) -> Self {
        let millis = interval.as_millis().max(1) as f64;
        Self {
            width,
            height,
            fps: 1000.0 / millis,
            source_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn test_for_interval_derives_fps() {
        let meta = VideoMetadata::for_interval(640, 480, Duration::from_millis(200));
        assert_eq!(meta.width, 640);
        assert_eq!(meta.height, 480);
        assert_relative_eq!(meta.fps, 5.0);
        assert!(meta.source_path.is_none());
    }

    #[test]
    fn test_for_interval_zero_does_not_divide_by_zero() {
        let meta = VideoMetadata::for_interval(10, 10, Duration::ZERO);
        assert_relative_eq!(meta.fps, 1000.0);
    }
}
