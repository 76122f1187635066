pub mod execution_provider;
pub mod math;
pub mod onnx_blazeface_detector;
pub mod onnx_face_mesh;
pub mod onnx_hand_landmarker;
pub mod onnx_object_detector;
pub mod onnx_vision_runtime;
