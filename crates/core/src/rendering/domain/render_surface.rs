use crate::detection::domain::detection_result::BoundingBox;
use crate::shared::frame::Frame;

use super::camera::OrthographicCamera;
use super::color::Color;
use super::coordinate_mapper::box_top_left;
use super::render_target::RenderTarget;
use super::scene::{Group, Label, SceneNode};

/// The shared overlay scene: a camera sized to the video frame plus the
/// geometry added by the most recent draw call.
///
/// Only the frame loop writes to it, one draw at a time.
pub struct RenderSurface {
    target: Option<Box<dyn RenderTarget>>,
    camera: OrthographicCamera,
    viewport: (u32, u32),
    scene: Vec<Group>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self {
            target: None,
            camera: OrthographicCamera::new(0, 0),
            viewport: (0, 0),
            scene: Vec::new(),
        }
    }

    /// Binds the render target. Later calls are ignored once a target is bound.
    pub fn init_renderer(&mut self, target: Box<dyn RenderTarget>) {
        if self.target.is_some() {
            log::debug!("Renderer already initialized, ignoring");
            return;
        }
        self.target = Some(target);
        let (w, h) = self.viewport;
        if let Some(t) = self.target.as_mut() {
            t.set_viewport(w, h);
        }
        log::info!("Renderer initialized");
    }

    pub fn is_renderer_initialized(&self) -> bool {
        self.target.is_some()
    }

    pub fn init_scene(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.camera.resize(width, height);
        self.scene.clear();
        if let Some(t) = self.target.as_mut() {
            t.set_viewport(width, height);
        }
    }

    /// Recomputes camera bounds for the video's native resolution.
    pub fn resize_camera(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    pub fn clear_scene(&mut self) {
        self.scene.clear();
    }

    pub fn add_to_scene(&mut self, group: Group) {
        self.scene.push(group);
    }

    pub fn set_background(&mut self, frame: &Frame, mirrored: bool) {
        if let Some(t) = self.target.as_mut() {
            t.set_background(frame, mirrored);
        }
    }

    /// Draws the scene to the bound target. Without a target this does nothing.
    pub fn render(&mut self) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        if let Err(e) = target.render(&self.camera, &self.scene) {
            log::warn!("Render failed: {e}");
        }
    }

    pub fn scene(&self) -> &[Group] {
        &self.scene
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn camera_left(&self) -> f32 {
        self.camera.left()
    }

    pub fn camera_right(&self) -> f32 {
        self.camera.right()
    }

    pub fn camera_top(&self) -> f32 {
        self.camera.top()
    }

    pub fn camera_bottom(&self) -> f32 {
        self.camera.bottom()
    }

    /// Label reading `"<name> <score>"` anchored at the box's visual top-left.
    ///
    /// Returns `None` for an empty name or a box outside the frame.
    pub fn create_label(
        &self,
        name: &str,
        score: f32,
        width: u32,
        height: u32,
        mirrored: bool,
        bbox: &BoundingBox,
        background: Color,
    ) -> Option<SceneNode> {
        if name.is_empty() {
            return None;
        }
        let outside = bbox.origin_x >= width as f32
            || bbox.origin_y >= height as f32
            || bbox.origin_x + bbox.width <= 0.0
            || bbox.origin_y + bbox.height <= 0.0;
        if outside {
            return None;
        }
        Some(SceneNode::Label(Label {
            text: format_label(name, score),
            anchor: box_top_left(&self.camera, bbox, mirrored),
            color: Color::LABEL_TEXT,
            background,
        }))
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_label(name: &str, score: f32) -> String {
    format!("{name} {score:.2}")
}
