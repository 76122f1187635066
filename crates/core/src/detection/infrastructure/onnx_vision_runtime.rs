use std::path::Path;

use crate::detection::domain::adapter_config::AdapterConfig;
use crate::detection::domain::detection_mode::DetectionMode;
use crate::detection::domain::vision_model::{AdapterError, VisionModel, VisionRuntime};
use crate::shared::constants::{
    FACE_MESH_MODEL_NAME, FACE_MESH_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
    HAND_LANDMARK_MODEL_NAME, HAND_LANDMARK_MODEL_URL, OBJECT_MODEL_NAME, OBJECT_MODEL_URL,
};
use crate::shared::model_resolver::{ModelAsset, ModelResolver, ProgressFn};

use super::onnx_blazeface_detector::OnnxBlazefaceDetector;
use super::onnx_face_mesh::OnnxFaceMesh;
use super::onnx_hand_landmarker::OnnxHandLandmarker;
use super::onnx_object_detector::OnnxObjectDetector;

/// The model file each mode runs.
pub fn model_asset(mode: DetectionMode) -> Option<ModelAsset> {
    let (name, url) = match mode {
        DetectionMode::Object => (OBJECT_MODEL_NAME, OBJECT_MODEL_URL),
        DetectionMode::Face => (FACE_MODEL_NAME, FACE_MODEL_URL),
        DetectionMode::Gesture => (HAND_LANDMARK_MODEL_NAME, HAND_LANDMARK_MODEL_URL),
        DetectionMode::FaceLandmark => (FACE_MESH_MODEL_NAME, FACE_MESH_MODEL_URL),
        DetectionMode::None => return None,
    };
    Some(ModelAsset { name, url })
}

/// Builds ONNX Runtime detectors, fetching model files through a
/// [`ModelResolver`].
pub struct OnnxVisionRuntime {
    resolver: ModelResolver,
}

impl OnnxVisionRuntime {
    pub fn new(resolver: ModelResolver) -> Self {
        Self { resolver }
    }

    fn build(
        mode: DetectionMode,
        path: &Path,
        config: &AdapterConfig,
    ) -> Result<Box<dyn VisionModel>, Box<dyn std::error::Error>> {
        let model: Box<dyn VisionModel> = match mode {
            DetectionMode::Object => Box::new(OnnxObjectDetector::new(path, config)?),
            DetectionMode::Face => Box::new(OnnxBlazefaceDetector::new(path, config)?),
            DetectionMode::Gesture => Box::new(OnnxHandLandmarker::new(path, config)?),
            DetectionMode::FaceLandmark => Box::new(OnnxFaceMesh::new(path, config)?),
            DetectionMode::None => return Err("no model for mode None".into()),
        };
        Ok(model)
    }
}

impl VisionRuntime for OnnxVisionRuntime {
    fn create_model(
        &self,
        mode: DetectionMode,
        config: &AdapterConfig,
    ) -> Result<Box<dyn VisionModel>, AdapterError> {
        let asset = model_asset(mode).ok_or(AdapterError::Unsupported(mode))?;
        let name = asset.name;
        let progress: ProgressFn = Box::new(move |done, total| {
            if total > 0 {
                log::debug!("Downloading {name}: {}%", done * 100 / total);
            }
        });
        let path = self
            .resolver
            .resolve(&asset, Some(progress))
            .map_err(|e| AdapterError::Runtime(Box::new(e)))?;
        log::info!("Loading {mode} model from {}", path.display());

        Self::build(mode, &path, config).map_err(|e| AdapterError::Runtime(e.to_string().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_adapter_mode_has_an_asset() {
        for &mode in DetectionMode::ADAPTERS {
            let asset = model_asset(mode).unwrap();
            assert!(asset.url.starts_with("https://"));
            assert!(asset.url.ends_with(asset.name));
        }
        assert!(model_asset(DetectionMode::None).is_none());
    }

    #[test]
    fn test_none_mode_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = OnnxVisionRuntime::new(ModelResolver::new(dir.path().to_path_buf(), None));
        let err = runtime
            .create_model(DetectionMode::None, &AdapterConfig::for_mode(DetectionMode::None))
            .err()
            .unwrap();
        assert!(matches!(err, AdapterError::Unsupported(DetectionMode::None)));
    }

    #[test]
    fn test_corrupt_cached_model_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FACE_MODEL_NAME), b"not an onnx model").unwrap();
        let runtime = OnnxVisionRuntime::new(ModelResolver::new(dir.path().to_path_buf(), None));

        let result = runtime.create_model(
            DetectionMode::Face,
            &AdapterConfig::for_mode(DetectionMode::Face),
        );

        assert!(matches!(result, Err(AdapterError::Runtime(_))));
    }
}
