pub mod adapter_config;
pub mod detection_mode;
pub mod detection_result;
pub mod gesture_classifier;
pub mod model_adapter;
pub mod model_load_result;
pub mod vision_model;
