/// Hand landmark model plus rule-based gesture recognition.
///
/// Runs MediaPipe's hand landmark network on the whole frame. Outputs, in
/// order: 21 screen landmarks `[1, 63]` in input pixels, hand presence
/// `[1, 1]`, handedness `[1, 1]` (> 0.5 is a right hand) and world
/// landmarks, which are ignored.
use std::path::{Path, PathBuf};

use crate::detection::domain::adapter_config::{AdapterConfig, Delegate};
use crate::detection::domain::detection_result::{
    Category, DetectionResult, GestureRecognizerResult, NormalizedLandmark,
};
use crate::detection::domain::gesture_classifier::{classify, HAND_LANDMARK_COUNT};
use crate::detection::domain::vision_model::VisionModel;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::math::{resize_to_tensor, PixelRange};

const INPUT_SIZE: u32 = 224;

pub struct OnnxHandLandmarker {
    session: ort::session::Session,
    model_path: PathBuf,
    delegate: Delegate,
    score_threshold: f32,
}

impl OnnxHandLandmarker {
    pub fn new(model_path: &Path, config: &AdapterConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: build_session(model_path, config.delegate)?,
            model_path: model_path.to_path_buf(),
            delegate: config.delegate,
            score_threshold: config.score_threshold,
        })
    }
}

impl VisionModel for OnnxHandLandmarker {
    fn infer(
        &mut self,
        frame: &Frame,
        _timestamp_ms: u64,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let input_tensor = resize_to_tensor(frame, INPUT_SIZE, PixelRange::Unit);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() < 3 {
            return Err(format!(
                "Hand landmark model expected at least 3 outputs, got {}",
                outputs.len()
            )
            .into());
        }

        let screen = outputs[0].try_extract_array::<f32>()?;
        let presence = outputs[1].try_extract_array::<f32>()?;
        let handedness = outputs[2].try_extract_array::<f32>()?;
        let screen = screen.as_slice().ok_or("Cannot get landmark slice")?;
        let presence = presence.iter().next().copied().ok_or("Empty presence output")?;
        let handedness = handedness
            .iter()
            .next()
            .copied()
            .ok_or("Empty handedness output")?;

        Ok(DetectionResult::Gestures(decode_hand(
            screen,
            presence,
            handedness,
            self.score_threshold,
        )))
    }

    fn apply_config(
        &mut self,
        config: &AdapterConfig,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if config.delegate != self.delegate {
            self.session =
                build_session(&self.model_path, config.delegate).map_err(|e| e.to_string())?;
            self.delegate = config.delegate;
        }
        self.score_threshold = config.score_threshold;
        Ok(())
    }
}

/// Builds the recognizer result for one hand, or an empty one when presence
/// is below `threshold`.
fn decode_hand(
    screen: &[f32],
    presence: f32,
    raw_handedness: f32,
    threshold: f32,
) -> GestureRecognizerResult {
    if presence < threshold || screen.len() < HAND_LANDMARK_COUNT * 3 {
        return GestureRecognizerResult::default();
    }
    let size = INPUT_SIZE as f32;
    let landmarks: Vec<NormalizedLandmark> = screen
        .chunks_exact(3)
        .take(HAND_LANDMARK_COUNT)
        .map(|p| NormalizedLandmark::new(p[0] / size, p[1] / size, p[2] / size))
        .collect();

    let handedness = if raw_handedness > 0.5 {
        Category::new(1, raw_handedness, "Right")
    } else {
        Category::new(0, 1.0 - raw_handedness, "Left")
    };
    let gesture = classify(&landmarks).to_category(presence);

    GestureRecognizerResult {
        gestures: vec![vec![gesture]],
        handedness: vec![vec![handedness]],
        landmarks: vec![landmarks],
    }
}
