use crate::detection::domain::adapter_config::AdapterConfig;
use crate::detection::domain::detection_result::{Category, Detection, DetectionResult};

use super::color::Color;
use super::coordinate_mapper::box_outline;
use super::overlay_painter::OverlayPainter;
use super::render_surface::RenderSurface;
use super::scene::{Group, Polyline, SceneNode};

pub const BOX_LINE_WIDTH: f32 = 0.008;

/// Category that gets the highlight colour.
const PERSON_CATEGORY: &str = "person";

/// Outlines each object with its best category as a label.
pub struct ObjectPainter;

impl ObjectPainter {
    pub fn outline_color(category_name: &str) -> Color {
        if category_name == PERSON_CATEGORY {
            Color::PERSON
        } else {
            Color::OBJECT
        }
    }
}

impl OverlayPainter for ObjectPainter {
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
        let detections: &[Detection] = match result {
            DetectionResult::Objects(d) => d,
            _ => &[],
        };

        let mut group = Group::new();
        for detection in detections {
            let Some(bbox) = detection.bounding_box.as_ref() else {
                continue;
            };
            let Some(best) = Category::best(&detection.categories) else {
                continue;
            };
            let color = Self::outline_color(&best.category_name);
            group.add(SceneNode::Line(Polyline {
                points: box_outline(surface.camera(), bbox, mirrored),
                color,
                line_width: BOX_LINE_WIDTH,
            }));
            if let Some(label) = surface.create_label(
                &best.display_name,
                best.score,
                width,
                height,
                mirrored,
                bbox,
                color,
            ) {
                group.add(label);
            }
        }

        surface.add_to_scene(group);
        surface.render();
    }
}
