use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which model adapter drives the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    None,
    Object,
    Face,
    Gesture,
    #[serde(rename = "landmark")]
    FaceLandmark,
}

impl DetectionMode {
    /// Adapter order at startup; the first one that loads becomes active.
    pub const ADAPTERS: &[DetectionMode] = &[
        DetectionMode::Object,
        DetectionMode::Face,
        DetectionMode::Gesture,
        DetectionMode::FaceLandmark,
    ];

    pub fn code(self) -> i32 {
        match self {
            DetectionMode::None => -1,
            DetectionMode::Object => 0,
            DetectionMode::Face => 1,
            DetectionMode::Gesture => 2,
            DetectionMode::FaceLandmark => 3,
        }
    }

    /// Unknown codes map to `None` so they select nothing.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DetectionMode::Object,
            1 => DetectionMode::Face,
            2 => DetectionMode::Gesture,
            3 => DetectionMode::FaceLandmark,
            _ => DetectionMode::None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DetectionMode::None => "None",
            DetectionMode::Object => "Object Detection",
            DetectionMode::Face => "Face Detection",
            DetectionMode::Gesture => "Gesture Recognition",
            DetectionMode::FaceLandmark => "Face Landmark Detection",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            DetectionMode::None => "none",
            DetectionMode::Object => "object",
            DetectionMode::Face => "face",
            DetectionMode::Gesture => "gesture",
            DetectionMode::FaceLandmark => "landmark",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DetectionMode {
    type Err = String;

    /// Accepts the short CLI name or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Ok(code) = lower.parse::<i32>() {
            return Ok(DetectionMode::from_code(code));
        }
        match lower.as_str() {
            "none" => Ok(DetectionMode::None),
            "object" => Ok(DetectionMode::Object),
            "face" => Ok(DetectionMode::Face),
            "gesture" => Ok(DetectionMode::Gesture),
            "landmark" | "face-landmark" => Ok(DetectionMode::FaceLandmark),
            other => Err(format!("unknown detection mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DetectionMode::None, -1)]
    #[case(DetectionMode::Object, 0)]
    #[case(DetectionMode::Face, 1)]
    #[case(DetectionMode::Gesture, 2)]
    #[case(DetectionMode::FaceLandmark, 3)]
    fn test_code_matches_from_code(#[case] mode: DetectionMode, #[case] code: i32) {
        assert_eq!(mode.code(), code);
        assert_eq!(DetectionMode::from_code(code), mode);
    }

    #[rstest]
    #[case(4)]
    #[case(-7)]
    #[case(i32::MAX)]
    fn test_unknown_codes_select_none(#[case] code: i32) {
        assert_eq!(DetectionMode::from_code(code), DetectionMode::None);
    }

    #[rstest]
    #[case("object", DetectionMode::Object)]
    #[case("Face", DetectionMode::Face)]
    #[case(" gesture ", DetectionMode::Gesture)]
    #[case("face-landmark", DetectionMode::FaceLandmark)]
    #[case("3", DetectionMode::FaceLandmark)]
    #[case("none", DetectionMode::None)]
    fn test_parse(#[case] input: &str, #[case] expected: DetectionMode) {
        assert_eq!(input.parse::<DetectionMode>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown_name() {
        assert!("pose".parse::<DetectionMode>().is_err());
    }

    #[test]
    fn test_display_uses_model_name() {
        assert_eq!(DetectionMode::Object.to_string(), "Object Detection");
        assert_eq!(DetectionMode::Gesture.to_string(), "Gesture Recognition");
    }

    #[test]
    fn test_short_name_parses_back() {
        for &mode in DetectionMode::ADAPTERS {
            assert_eq!(mode.short_name().parse::<DetectionMode>().unwrap(), mode);
        }
    }
}
