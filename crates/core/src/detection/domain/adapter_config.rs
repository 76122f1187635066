use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::detection_mode::DetectionMode;

/// Compute backend an adapter's session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delegate {
    Cpu,
    Gpu,
}

impl fmt::Display for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delegate::Cpu => write!(f, "CPU"),
            Delegate::Gpu => write!(f, "GPU"),
        }
    }
}

impl FromStr for Delegate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Delegate::Cpu),
            "gpu" => Ok(Delegate::Gpu),
            other => Err(format!("unknown delegate: {other}")),
        }
    }
}

/// `Video` requires monotonically increasing timestamps; `Image` treats
/// every frame independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningMode {
    Image,
    Video,
}

impl FromStr for RunningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(RunningMode::Image),
            "video" => Ok(RunningMode::Video),
            other => Err(format!("unknown running mode: {other}")),
        }
    }
}

/// How the face-landmark overlay renders the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceMeshDrawingMode {
    /// Triangle mesh joining neighbouring landmarks.
    #[default]
    Tesselation,
    Points,
    FaceOval,
}

impl FromStr for FaceMeshDrawingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tesselation" | "tessellation" | "mesh" => Ok(FaceMeshDrawingMode::Tesselation),
            "points" => Ok(FaceMeshDrawingMode::Points),
            "face_oval" | "oval" => Ok(FaceMeshDrawingMode::FaceOval),
            other => Err(format!("unknown drawing mode: {other}")),
        }
    }
}

/// Bounds and slider step for one tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// `NaN` maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

/// Per-mode parameter bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigLimits {
    pub max_results: ParameterRange,
    pub score_threshold: ParameterRange,
}

impl ConfigLimits {
    pub fn for_mode(mode: DetectionMode) -> Self {
        let score_threshold = ParameterRange::new(0.0, 1.0, 0.1);
        let max_results = match mode {
            DetectionMode::Object | DetectionMode::Face => ParameterRange::new(0.0, 10.0, 1.0),
            DetectionMode::Gesture => ParameterRange::new(1.0, 2.0, 1.0),
            DetectionMode::FaceLandmark | DetectionMode::None => ParameterRange::new(1.0, 1.0, 1.0),
        };
        Self {
            max_results,
            score_threshold,
        }
    }
}

/// Mutable runtime options of one adapter.
///
/// Setters only change these fields; the live detector picks them up on the
/// next `update_config`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub score_threshold: f32,
    pub max_results: usize,
    pub delegate: Delegate,
    pub running_mode: RunningMode,
    pub display_names_locale: String,
    pub drawing_mode: FaceMeshDrawingMode,
    limits: ConfigLimits,
}

impl AdapterConfig {
    pub fn for_mode(mode: DetectionMode) -> Self {
        let limits = ConfigLimits::for_mode(mode);
        let max_results = match mode {
            DetectionMode::Object | DetectionMode::Face => 5,
            _ => 1,
        };
        Self {
            score_threshold: 0.5,
            max_results,
            delegate: Delegate::Gpu,
            running_mode: RunningMode::Video,
            display_names_locale: "en".to_string(),
            drawing_mode: FaceMeshDrawingMode::default(),
            limits,
        }
    }

    pub fn limits(&self) -> &ConfigLimits {
        &self.limits
    }

    pub fn set_score_threshold(&mut self, score: f32) {
        self.score_threshold = self.limits.score_threshold.clamp(score as f64) as f32;
    }

    pub fn set_max_results(&mut self, max: usize) {
        self.max_results = self.limits.max_results.clamp(max as f64) as usize;
    }

    pub fn set_delegate(&mut self, delegate: Delegate) {
        self.delegate = delegate;
    }

    pub fn set_running_mode(&mut self, mode: RunningMode) {
        self.running_mode = mode;
    }

    pub fn set_drawing_mode(&mut self, mode: FaceMeshDrawingMode) {
        self.drawing_mode = mode;
    }
}
