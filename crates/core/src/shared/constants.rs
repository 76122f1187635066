use std::time::Duration;

pub const OBJECT_MODEL_NAME: &str = "yolov8n_coco.onnx";
pub const OBJECT_MODEL_URL: &str =
    "https://github.com/live-vision/live-vision/releases/download/models-v1/yolov8n_coco.onnx";

pub const FACE_MODEL_NAME: &str = "blaze_face_short_range.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/live-vision/live-vision/releases/download/models-v1/blaze_face_short_range.onnx";

pub const HAND_LANDMARK_MODEL_NAME: &str = "hand_landmark_full.onnx";
pub const HAND_LANDMARK_MODEL_URL: &str =
    "https://github.com/live-vision/live-vision/releases/download/models-v1/hand_landmark_full.onnx";

pub const FACE_MESH_MODEL_NAME: &str = "face_mesh_468.onnx";
pub const FACE_MESH_MODEL_URL: &str =
    "https://github.com/live-vision/live-vision/releases/download/models-v1/face_mesh_468.onnx";

/// Tick interval of the prediction loop.
pub const DEFAULT_LOOP_INTERVAL: Duration = Duration::from_millis(150);

pub const DEFAULT_SCENE_WIDTH: u32 = 1280;
pub const DEFAULT_SCENE_HEIGHT: u32 = 720;

pub const ERROR_ENABLE_CAMERA_PERMISSION_MSG: &str = "Please enable camera permission";
pub const ERROR_NO_CAMERA_DEVICE_AVAILABLE_MSG: &str = "No camera device available";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
