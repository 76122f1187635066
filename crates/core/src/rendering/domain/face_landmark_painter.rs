use crate::detection::domain::adapter_config::{AdapterConfig, FaceMeshDrawingMode};
use crate::detection::domain::detection_result::{DetectionResult, NormalizedLandmark};

use super::color::Color;
use super::coordinate_mapper::landmark_point;
use super::overlay_painter::OverlayPainter;
use super::render_surface::RenderSurface;
use super::scene::{Group, PointCloud, Polyline, SceneNode};
use super::tesselation::delaunay_edges;

/// Mesh indices tracing the face outline, clockwise from the forehead.
pub const FACE_OVAL: &[usize] = &[
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

const MESH_POINT_RADIUS: f32 = 1.0;
const MESH_LINE_WIDTH: f32 = 0.001;
const OVAL_LINE_WIDTH: f32 = 0.003;

pub struct FaceLandmarkPainter;

impl FaceLandmarkPainter {
    fn paint_face(
        surface: &RenderSurface,
        group: &mut Group,
        landmarks: &[NormalizedLandmark],
        drawing_mode: FaceMeshDrawingMode,
        mirrored: bool,
        width: u32,
        height: u32,
    ) {
        let camera = surface.camera();
        match drawing_mode {
            FaceMeshDrawingMode::Tesselation => {
                let points: Vec<_> = landmarks
                    .iter()
                    .map(|lm| landmark_point(camera, lm, width, height, mirrored))
                    .collect();
                for (a, b) in delaunay_edges(&points) {
                    group.add(SceneNode::Line(Polyline {
                        points: vec![points[a], points[b]],
                        color: Color::FACE_MESH,
                        line_width: MESH_LINE_WIDTH,
                    }));
                }
            }
            FaceMeshDrawingMode::Points => {
                let points = landmarks
                    .iter()
                    .map(|lm| landmark_point(camera, lm, width, height, mirrored))
                    .collect();
                group.add(SceneNode::Points(PointCloud {
                    points,
                    color: Color::FACE_MESH,
                    radius: MESH_POINT_RADIUS,
                }));
            }
            FaceMeshDrawingMode::FaceOval => {
                let mut points: Vec<_> = FACE_OVAL
                    .iter()
                    .filter_map(|&i| landmarks.get(i))
                    .map(|lm| landmark_point(camera, lm, width, height, mirrored))
                    .collect();
                if let Some(&first) = points.first() {
                    points.push(first);
                }
                if points.len() > 1 {
                    group.add(SceneNode::Line(Polyline {
                        points,
                        color: Color::FACE_MESH,
                        line_width: OVAL_LINE_WIDTH,
                    }));
                }
            }
        }
    }
}

impl OverlayPainter for FaceLandmarkPainter {
    fn paint(
        &self,
        surface: &mut RenderSurface,
        config: &AdapterConfig,
        mirrored: bool,
        result: &DetectionResult,
        width: u32,
        height: u32,
    ) {
        surface.clear_scene();
        let mut group = Group::new();
        if let DetectionResult::FaceLandmarks(faces) = result {
            for landmarks in &faces.face_landmarks {
                Self::paint_face(
                    surface,
                    &mut group,
                    landmarks,
                    config.drawing_mode,
                    mirrored,
                    width,
                    height,
                );
            }
        }
        surface.add_to_scene(group);
        surface.render();
    }
}
