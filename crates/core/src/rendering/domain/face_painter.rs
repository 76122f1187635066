use crate::detection::domain::adapter_config::AdapterConfig;
use crate::detection::domain::detection_result::{Category, Detection, DetectionResult};

use super::color::Color;
use super::coordinate_mapper::{box_outline, landmark_point};
use super::object_painter::BOX_LINE_WIDTH;
use super::overlay_painter::OverlayPainter;
use super::render_surface::RenderSurface;
use super::scene::{Group, PointCloud, Polyline, SceneNode};

const KEYPOINT_RADIUS: f32 = 3.0;

/// Outlines faces and marks the detector's keypoints (eyes, nose, mouth, ears).
pub struct FacePainter;

impl OverlayPainter for FacePainter {
    fn paint(
        &self,
        surface: &mut RenderSurface,
        _config: &AdapterConfig,
        mirrored: bool,
        result: &DetectionResult,
        width: u32,
        height: u32,
    ) {
        surface.clear_scene();
        let faces: &[Detection] = match result {
            DetectionResult::Faces(d) => d,
            _ => &[],
        };

        let mut group = Group::new();
        for face in faces {
            if let Some(bbox) = face.bounding_box.as_ref() {
                group.add(SceneNode::Line(Polyline {
                    points: box_outline(surface.camera(), bbox, mirrored),
                    color: Color::FACE,
                    line_width: BOX_LINE_WIDTH,
                }));
                if let Some(best) = Category::best(&face.categories) {
                    if let Some(label) = surface.create_label(
                        &best.display_name,
                        best.score,
                        width,
                        height,
                        mirrored,
                        bbox,
                        Color::FACE,
                    ) {
                        group.add(label);
                    }
                }
            }
            if !face.keypoints.is_empty() {
                let points = face
                    .keypoints
                    .iter()
                    .map(|kp| landmark_point(surface.camera(), kp, width, height, mirrored))
                    .collect();
                group.add(SceneNode::Points(PointCloud {
                    points,
                    color: Color::FACE_KEYPOINT,
                    radius: KEYPOINT_RADIUS,
                }));
            }
        }

        surface.add_to_scene(group);
        surface.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_mode::DetectionMode;
    use crate::detection::domain::detection_result::{BoundingBox, NormalizedLandmark};
    use approx::assert_relative_eq;

    #[test]
    fn test_face_box_label_and_keypoints() {
        let mut surface = RenderSurface::new();
        surface.init_scene(200, 100);
        let result = DetectionResult::Faces(vec![Detection {
            bounding_box: Some(BoundingBox::new(20.0, 10.0, 40.0, 40.0)),
            categories: vec![Category::new(0, 0.87, "face")],
            keypoints: vec![
                NormalizedLandmark::new(0.5, 0.5, 0.0),
                NormalizedLandmark::new(0.25, 0.2, 0.0),
            ],
        }]);

        FacePainter.paint(
            &mut surface,
            &AdapterConfig::for_mode(DetectionMode::Face),
            true,
            &result,
            200,
            100,
        );

        let group = &surface.scene()[0];
        assert_eq!(group.lines().next().unwrap().color, Color::FACE);
        assert_eq!(group.labels().next().unwrap().text, "face 0.87");
        let cloud = group.point_clouds().next().unwrap();
        assert_eq!(cloud.points.len(), 2);
        // mirrored: right bound (100) minus 0.25 * 200
        assert_relative_eq!(cloud.points[1].x, 50.0);
        assert_relative_eq!(cloud.points[1].y, 30.0);
    }

    #[test]
    fn test_mismatched_result_draws_nothing() {
        let mut surface = RenderSurface::new();
        surface.init_scene(200, 100);
        FacePainter.paint(
            &mut surface,
            &AdapterConfig::for_mode(DetectionMode::Face),
            false,
            &DetectionResult::Objects(Vec::new()),
            200,
            100,
        );
        assert!(surface.scene()[0].is_empty());
    }
}
