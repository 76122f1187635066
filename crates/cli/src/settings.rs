use std::path::Path;

use serde::Deserialize;

use live_vision_core::detection::domain::detection_mode::DetectionMode;
use live_vision_core::pipeline::overlay_controller::ModelSettings;

/// Optional JSON settings file. Command-line flags override it.
///
/// ```json
/// {
///   "mode": "object",
///   "mirrored": true,
///   "interval_ms": 150,
///   "object": { "score_threshold": 0.4, "max_results": 3, "delegate": "cpu" },
///   "landmark": { "drawing_mode": "face_oval" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub mode: Option<DetectionMode>,
    pub mirrored: Option<bool>,
    pub interval_ms: Option<u64>,
    pub object: ModelSettings,
    pub face: ModelSettings,
    pub gesture: ModelSettings,
    pub landmark: ModelSettings,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
        Ok(settings)
    }

    pub fn for_mode(&self, mode: DetectionMode) -> ModelSettings {
        match mode {
            DetectionMode::Object => self.object.clone(),
            DetectionMode::Face => self.face.clone(),
            DetectionMode::Gesture => self.gesture.clone(),
            DetectionMode::FaceLandmark => self.landmark.clone(),
            DetectionMode::None => ModelSettings::default(),
        }
    }
}
