/// MediaPipe Face Mesh using ONNX Runtime via `ort`.
///
/// 192×192 input in `[-1, 1]`; outputs 468 landmarks `(x, y, z)` in input
/// pixels and a face-presence logit.
use std::path::{Path, PathBuf};

use crate::detection::domain::adapter_config::{AdapterConfig, Delegate};
use crate::detection::domain::detection_result::{
    DetectionResult, FaceLandmarkerResult, NormalizedLandmark,
};
use crate::detection::domain::vision_model::VisionModel;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::math::{resize_to_tensor, sigmoid, PixelRange};

const INPUT_SIZE: u32 = 192;

pub const FACE_MESH_LANDMARK_COUNT: usize = 468;

pub struct OnnxFaceMesh {
    session: ort::session::Session,
    model_path: PathBuf,
    delegate: Delegate,
    score_threshold: f32,
}

impl OnnxFaceMesh {
    pub fn new(model_path: &Path, config: &AdapterConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: build_session(model_path, config.delegate)?,
            model_path: model_path.to_path_buf(),
            delegate: config.delegate,
            score_threshold: config.score_threshold,
        })
    }
}

impl VisionModel for OnnxFaceMesh {
    fn infer(
        &mut self,
        frame: &Frame,
        _timestamp_ms: u64,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let input_tensor = resize_to_tensor(frame, INPUT_SIZE, PixelRange::Signed);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() < 2 {
            return Err(
                format!("Face mesh model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let mesh = outputs[0].try_extract_array::<f32>()?;
        let flag = outputs[1].try_extract_array::<f32>()?;
        let mesh = mesh.as_slice().ok_or("Cannot get mesh slice")?;
        let flag = flag.iter().next().copied().ok_or("Empty face flag output")?;

        Ok(DetectionResult::FaceLandmarks(decode_mesh(
            mesh,
            sigmoid(flag),
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

fn decode_mesh(mesh: &[f32], presence: f32, threshold: f32) -> FaceLandmarkerResult {
    if presence < threshold || mesh.len() < FACE_MESH_LANDMARK_COUNT * 3 {
        return FaceLandmarkerResult::default();
    }
    let size = INPUT_SIZE as f32;
    let landmarks = mesh
        .chunks_exact(3)
        .take(FACE_MESH_LANDMARK_COUNT)
        .map(|p| NormalizedLandmark::new(p[0] / size, p[1] / size, p[2] / size))
        .collect();
    FaceLandmarkerResult {
        face_landmarks: vec![landmarks],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mesh() -> Vec<f32> {
        vec![96.0; FACE_MESH_LANDMARK_COUNT * 3]
    }

    #[test]
    fn test_decode_normalizes_landmarks() {
        let r = decode_mesh(&mesh(), 0.9, 0.5);
        assert_eq!(r.face_landmarks.len(), 1);
        assert_eq!(r.face_landmarks[0].len(), FACE_MESH_LANDMARK_COUNT);
        assert_relative_eq!(r.face_landmarks[0][467].x, 0.5);
    }

    #[test]
    fn test_absent_face_is_empty() {
        assert!(decode_mesh(&mesh(), 0.1, 0.5).face_landmarks.is_empty());
    }

    #[test]
    fn test_truncated_output_is_empty() {
        assert!(decode_mesh(&[0.0; 99], 0.9, 0.5).face_landmarks.is_empty());
    }
}
