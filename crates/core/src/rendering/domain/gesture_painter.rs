use crate::detection::domain::adapter_config::AdapterConfig;
use crate::detection::domain::detection_result::{
    BoundingBox, Category, DetectionResult, GestureRecognizerResult, NormalizedLandmark,
};

use super::color::Color;
use super::coordinate_mapper::landmark_point;
use super::overlay_painter::OverlayPainter;
use super::render_surface::RenderSurface;
use super::scene::{Group, PointCloud, Polyline, SceneNode};

/// Bone pairs of the 21-point hand skeleton: the palm loop, then each finger
/// from its base outwards.
pub const HAND_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 5),
    (5, 9),
    (9, 13),
    (13, 17),
    (17, 0),
    (1, 2),
    (2, 3),
    (3, 4),
    (5, 6),
    (6, 7),
    (7, 8),
    (9, 10),
    (10, 11),
    (11, 12),
    (13, 14),
    (14, 15),
    (15, 16),
    (17, 18),
    (18, 19),
    (19, 20),
];

const CONNECTION_LINE_WIDTH: f32 = 0.004;
const LANDMARK_RADIUS: f32 = 4.0;

/// Draws each hand's skeleton and labels it with the top gesture.
pub struct GesturePainter;

impl GesturePainter {
    fn paint_hand(
        surface: &RenderSurface,
        group: &mut Group,
        landmarks: &[NormalizedLandmark],
        gesture: Option<&Category>,
        mirrored: bool,
        width: u32,
        height: u32,
    ) {
        let camera = surface.camera();
        let points: Vec<_> = landmarks
            .iter()
            .map(|lm| landmark_point(camera, lm, width, height, mirrored))
            .collect();

        for &(a, b) in HAND_CONNECTIONS {
            if let (Some(&pa), Some(&pb)) = (points.get(a), points.get(b)) {
                group.add(SceneNode::Line(Polyline {
                    points: vec![pa, pb],
                    color: Color::HAND_CONNECTION,
                    line_width: CONNECTION_LINE_WIDTH,
                }));
            }
        }
        group.add(SceneNode::Points(PointCloud {
            points,
            color: Color::HAND_LANDMARK,
            radius: LANDMARK_RADIUS,
        }));

        let Some(gesture) = gesture else {
            return;
        };
        if let Some(bbox) = landmark_bounds(landmarks, width, height) {
            if let Some(label) = surface.create_label(
                &gesture.display_name,
                gesture.score,
                width,
                height,
                mirrored,
                &bbox,
                Color::LABEL_BACKGROUND,
            ) {
                group.add(label);
            }
        }
    }
}

impl OverlayPainter for GesturePainter {
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
        let empty = GestureRecognizerResult::default();
        let hands = match result {
            DetectionResult::Gestures(g) => g,
            _ => &empty,
        };

        let mut group = Group::new();
        for (i, landmarks) in hands.landmarks.iter().enumerate() {
            let gesture = hands.gestures.get(i).and_then(|g| Category::best(g));
            Self::paint_hand(surface, &mut group, landmarks, gesture, mirrored, width, height);
        }

        surface.add_to_scene(group);
        surface.render();
    }
}

/// Pixel-space box enclosing a set of normalized landmarks.
pub fn landmark_bounds(
    landmarks: &[NormalizedLandmark],
    width: u32,
    height: u32,
) -> Option<BoundingBox> {
    let first = landmarks.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for lm in &landmarks[1..] {
        min_x = min_x.min(lm.x);
        min_y = min_y.min(lm.y);
        max_x = max_x.max(lm.x);
        max_y = max_y.max(lm.y);
    }
    let (w, h) = (width as f32, height as f32);
    Some(BoundingBox::new(
        min_x * w,
        min_y * h,
        (max_x - min_x) * w,
        (max_y - min_y) * h,
    ))
}
