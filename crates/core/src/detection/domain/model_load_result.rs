use super::detection_mode::DetectionMode;

/// Outcome of loading one adapter at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLoadResult {
    pub model_name: String,
    pub mode: DetectionMode,
    pub load_result: bool,
}

impl ModelLoadResult {
    pub fn failed(mode: DetectionMode) -> Self {
        Self {
            model_name: mode.display_name().to_string(),
            mode,
            load_result: false,
        }
    }

    pub fn loaded(mode: DetectionMode) -> Self {
        Self {
            load_result: true,
            ..Self::failed(mode)
        }
    }

    /// Keeps only successful loads, preserving order.
    pub fn enabled(results: Vec<ModelLoadResult>) -> Vec<ModelLoadResult> {
        results.into_iter().filter(|r| r.load_result).collect()
    }

    /// First successfully loaded mode, or `None` when nothing loaded.
    pub fn initial_mode(results: &[ModelLoadResult]) -> DetectionMode {
        results
            .iter()
            .find(|r| r.load_result)
            .map(|r| r.mode)
            .unwrap_or(DetectionMode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_carries_display_name() {
        let r = ModelLoadResult::failed(DetectionMode::Face);
        assert_eq!(r.model_name, "Face Detection");
        assert!(!r.load_result);
    }

    #[test]
    fn test_enabled_filters_failures_in_order() {
        let results = vec![
            ModelLoadResult::failed(DetectionMode::Object),
            ModelLoadResult::loaded(DetectionMode::Face),
            ModelLoadResult::failed(DetectionMode::Gesture),
            ModelLoadResult::loaded(DetectionMode::FaceLandmark),
        ];
        let enabled = ModelLoadResult::enabled(results);
        let modes: Vec<_> = enabled.iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![DetectionMode::Face, DetectionMode::FaceLandmark]);
    }

    #[test]
    fn test_initial_mode_is_first_loaded() {
        let results = vec![
            ModelLoadResult::failed(DetectionMode::Object),
            ModelLoadResult::loaded(DetectionMode::Gesture),
            ModelLoadResult::loaded(DetectionMode::Face),
        ];
        assert_eq!(ModelLoadResult::initial_mode(&results), DetectionMode::Gesture);
    }

    #[test]
    fn test_initial_mode_none_when_nothing_loaded() {
        let results = vec![ModelLoadResult::failed(DetectionMode::Object)];
        assert_eq!(ModelLoadResult::initial_mode(&results), DetectionMode::None);
        assert_eq!(ModelLoadResult::initial_mode(&[]), DetectionMode::None);
    }
}
