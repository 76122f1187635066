/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// Short-range model: 128×128 input, 896 anchors, six keypoints per face
/// (eyes, nose tip, mouth, ear tragions).
use std::path::{Path, PathBuf};

use crate::detection::domain::adapter_config::{AdapterConfig, Delegate};
use crate::detection::domain::detection_result::{
    BoundingBox, Category, Detection, DetectionResult, NormalizedLandmark,
};
use crate::detection::domain::vision_model::VisionModel;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::math::{nms, resize_to_tensor, sigmoid, PixelRange, Scored};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box (4) + 6 keypoints × 2.
const REGRESSOR_STRIDE: usize = 16;

const NUM_KEYPOINTS: usize = 6;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    model_path: PathBuf,
    delegate: Delegate,
    anchors: Vec<[f32; 2]>,
    score_threshold: f32,
    max_results: usize,
}

impl OnnxBlazefaceDetector {
    pub fn new(model_path: &Path, config: &AdapterConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path, config.delegate)?;
        Ok(Self {
            session,
            model_path: model_path.to_path_buf(),
            delegate: config.delegate,
            anchors: generate_anchors(),
            score_threshold: config.score_threshold,
            max_results: config.max_results,
        })
    }
}

impl VisionModel for OnnxBlazefaceDetector {
    fn infer(
        &mut self,
        frame: &Frame,
        _timestamp_ms: u64,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let input_tensor = resize_to_tensor(frame, INPUT_SIZE, PixelRange::Signed);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut raw = decode(
            &self.anchors,
            reg_data,
            score_data,
            self.score_threshold,
            (frame.width(), frame.height()),
        );
        let mut faces = nms(&mut raw, NMS_IOU_THRESH);
        if self.max_results > 0 {
            faces.truncate(self.max_results);
        }

        Ok(DetectionResult::Faces(
            faces.into_iter().map(RawFace::into_detection).collect(),
        ))
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
        self.max_results = config.max_results;
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct RawFace {
    corners: [f64; 4],
    score: f64,
    keypoints: Vec<NormalizedLandmark>,
}

impl RawFace {
    fn into_detection(self) -> Detection {
        Detection {
            bounding_box: Some(BoundingBox::from_corners(self.corners)),
            categories: vec![Category::new(0, self.score as f32, "face")],
            keypoints: self.keypoints,
        }
    }
}

impl Scored for RawFace {
    fn corners(&self) -> [f64; 4] {
        self.corners
    }

    fn score(&self) -> f64 {
        self.score
    }
}

/// Decodes anchor-relative boxes and keypoints above `threshold`.
fn decode(
    anchors: &[[f32; 2]],
    reg_data: &[f32],
    score_data: &[f32],
    threshold: f32,
    frame_size: (u32, u32),
) -> Vec<RawFace> {
    let (fw, fh) = (frame_size.0 as f32, frame_size.1 as f32);
    let size = INPUT_SIZE as f32;
    let num_anchors = anchors.len().min(NUM_ANCHORS);
    let mut faces = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if score < threshold {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        if offset + REGRESSOR_STRIDE > reg_data.len() {
            break;
        }
        let reg = &reg_data[offset..offset + REGRESSOR_STRIDE];
        let anchor = anchors[i];

        let cx = anchor[0] + reg[0] / size;
        let cy = anchor[1] + reg[1] / size;
        let w = reg[2] / size;
        let h = reg[3] / size;

        let x1 = ((cx - w / 2.0) * fw).max(0.0);
        let y1 = ((cy - h / 2.0) * fh).max(0.0);
        let x2 = ((cx + w / 2.0) * fw).min(fw);
        let y2 = ((cy + h / 2.0) * fh).min(fh);

        let keypoints = (0..NUM_KEYPOINTS)
            .map(|k| {
                NormalizedLandmark::new(
                    anchor[0] + reg[4 + k * 2] / size,
                    anchor[1] + reg[4 + k * 2 + 1] / size,
                    0.0,
                )
            })
            .collect();

        faces.push(RawFace {
            corners: [x1 as f64, y1 as f64, x2 as f64, y2 as f64],
            score: score as f64,
            keypoints,
        });
    }
    faces
}

/// Two feature maps, 16×16 with 2 anchors per cell and 8×8 with 6.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}
