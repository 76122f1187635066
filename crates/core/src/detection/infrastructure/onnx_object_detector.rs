/// COCO object detector using ONNX Runtime via `ort`.
///
/// Expects a YOLOv8-style export: one output of shape `[1, 4 + classes, N]`
/// (or its transpose) holding `cx, cy, w, h` followed by per-class scores.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::detection::domain::adapter_config::{AdapterConfig, Delegate};
use crate::detection::domain::detection_result::{BoundingBox, Category, Detection, DetectionResult};
use crate::detection::domain::vision_model::VisionModel;
use crate::shared::frame::Frame;

use super::execution_provider::{build_session, square_input_size};
use super::math::{letterbox, nms, Letterbox, Scored};

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

pub struct OnnxObjectDetector {
    session: ort::session::Session,
    model_path: PathBuf,
    delegate: Delegate,
    input_size: u32,
    score_threshold: f32,
    max_results: usize,
}

impl OnnxObjectDetector {
    pub fn new(model_path: &Path, config: &AdapterConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path, config.delegate)?;
        let input_size = square_input_size(&session, DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            model_path: model_path.to_path_buf(),
            delegate: config.delegate,
            input_size,
            score_threshold: config.score_threshold,
            max_results: config.max_results,
        })
    }
}

impl VisionModel for OnnxObjectDetector {
    fn infer(
        &mut self,
        frame: &Frame,
        _timestamp_ms: u64,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let (input_tensor, lb) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Object model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = decode_output(
            data,
            tensor.shape(),
            &lb,
            self.score_threshold,
            (frame.width(), frame.height()),
        )?;
        let detections = select(&mut candidates, self.max_results);
        Ok(DetectionResult::Objects(detections))
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
struct Candidate {
    corners: [f64; 4],
    score: f64,
    class: usize,
}

impl Scored for Candidate {
    fn corners(&self) -> [f64; 4] {
        self.corners
    }

    fn score(&self) -> f64 {
        self.score
    }
}

/// Parses the raw output into frame-space candidates above `score_threshold`.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    lb: &Letterbox,
    score_threshold: f32,
    frame_size: (u32, u32),
) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected object model output shape: {shape:?}").into());
    }
    // [1, features, detections] is the usual export; accept the transpose too.
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= 4 {
        return Err(format!("Object model output has no class scores: {shape:?}").into());
    }
    let at = |det: usize, feat: usize| {
        if transposed {
            data[feat * num_dets + det]
        } else {
            data[det * num_feats + feat]
        }
    };

    let (fw, fh) = (frame_size.0 as f64, frame_size.1 as f64);
    let mut candidates = Vec::new();
    for i in 0..num_dets {
        let (class, score) = (4..num_feats)
            .map(|f| (f - 4, at(i, f)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < score_threshold {
            continue;
        }

        let (cx, cy, w, h) = (
            at(i, 0) as f64,
            at(i, 1) as f64,
            at(i, 2) as f64,
            at(i, 3) as f64,
        );
        let (x1, y1) = lb.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = lb.to_frame(cx + w / 2.0, cy + h / 2.0);
        candidates.push(Candidate {
            corners: [x1.max(0.0), y1.max(0.0), x2.min(fw), y2.min(fh)],
            score: score as f64,
            class,
        });
    }
    Ok(candidates)
}

/// Per-class NMS, then the top `max_results` by score. `0` keeps everything.
fn select(candidates: &mut [Candidate], max_results: usize) -> Vec<Detection> {
    let mut by_class: HashMap<usize, Vec<Candidate>> = HashMap::new();
    for c in candidates.iter() {
        by_class.entry(c.class).or_default().push(c.clone());
    }
    let mut kept: Vec<Candidate> = by_class
        .into_values()
        .flat_map(|mut group| nms(&mut group, NMS_IOU_THRESH))
        .collect();
    kept.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if max_results > 0 {
        kept.truncate(max_results);
    }

    kept.into_iter()
        .map(|c| {
            let name = COCO_LABELS.get(c.class).copied().unwrap_or("unknown");
            Detection {
                bounding_box: Some(BoundingBox::from_corners(c.corners)),
                categories: vec![Category::new(c.class as i32, c.score as f32, name)],
                keypoints: Vec::new(),
            }
        })
        .collect()
}
