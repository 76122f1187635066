use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use crossbeam_channel::{Sender, TrySendError};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::rendering::domain::camera::OrthographicCamera;
use crate::rendering::domain::color::Color;
use crate::rendering::domain::render_target::RenderTarget;
use crate::rendering::domain::scene::{Group, Label, PointCloud, Polyline, SceneNode};
use crate::shared::frame::Frame;

const LABEL_PADDING: i32 = 3;

/// Software render target: composites the scene over the latest video frame
/// with `imageproc` and publishes each composite as a new [`Frame`].
pub struct FrameRasterizer {
    viewport: (u32, u32),
    background: Option<Frame>,
    font: Option<FontVec>,
    output: Option<Sender<Frame>>,
    last: Option<Frame>,
}

impl FrameRasterizer {
    pub fn new() -> Self {
        Self {
            viewport: (0, 0),
            background: None,
            font: None,
            output: None,
            last: None,
        }
    }

    /// Loads a TTF/OTF font for label text. Without a font only the label
    /// backgrounds are drawn.
    pub fn with_font_file(mut self, path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("Invalid font {}: {e}", path.display()))?;
        self.font = Some(font);
        Ok(self)
    }

    /// Composites are sent here without blocking; frames are dropped while
    /// the receiver lags behind.
    pub fn with_output(mut self, sender: Sender<Frame>) -> Self {
        self.output = Some(sender);
        self
    }

    pub fn last_composite(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    fn canvas(&self) -> RgbImage {
        match &self.background {
            Some(frame) => RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                .unwrap_or_else(|| RgbImage::new(frame.width(), frame.height())),
            None => RgbImage::new(self.viewport.0, self.viewport.1),
        }
    }

    fn draw_polyline(img: &mut RgbImage, camera: &OrthographicCamera, line: &Polyline) {
        let (w, h) = img.dimensions();
        let thickness = (line.line_width * w as f32).round().max(1.0) as i32;
        let color = rgb(line.color);
        let projected: Vec<(f32, f32)> = line
            .points
            .iter()
            .map(|p| camera.to_viewport(p.x, p.y, w, h))
            .collect();
        for seg in projected.windows(2) {
            draw_thick_segment(img, seg[0], seg[1], thickness, color);
        }
    }

    fn draw_points(img: &mut RgbImage, camera: &OrthographicCamera, cloud: &PointCloud) {
        let (w, h) = img.dimensions();
        let radius = cloud.radius.round().max(1.0) as i32;
        for p in &cloud.points {
            let (x, y) = camera.to_viewport(p.x, p.y, w, h);
            draw_filled_circle_mut(img, (x as i32, y as i32), radius, rgb(cloud.color));
        }
    }

    fn draw_label(&self, img: &mut RgbImage, camera: &OrthographicCamera, label: &Label) {
        let (w, h) = img.dimensions();
        let (x, y) = camera.to_viewport(label.anchor.x, label.anchor.y, w, h);
        let scale = PxScale::from((h as f32 / 30.0).max(12.0));
        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(scale, font, &label.text),
            None => ((label.text.len() as f32 * scale.x * 0.5) as u32, scale.y as u32),
        };
        let box_w = text_w + 2 * LABEL_PADDING as u32;
        let box_h = text_h + 2 * LABEL_PADDING as u32;
        // Sit just above the box, or inside it when clipped at the top edge.
        let top = if y as i32 >= box_h as i32 {
            y as i32 - box_h as i32
        } else {
            y as i32
        };
        let left = x as i32;
        if box_w > 0 && box_h > 0 {
            draw_filled_rect_mut(
                img,
                Rect::at(left, top).of_size(box_w, box_h),
                rgb(label.background),
            );
        }
        if let Some(font) = &self.font {
            draw_text_mut(
                img,
                rgb(label.color),
                left + LABEL_PADDING,
                top + LABEL_PADDING,
                scale,
                font,
                &label.text,
            );
        }
    }

    fn publish(&mut self, frame: Frame) {
        if let Some(sender) = &self.output {
            match sender.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::debug!("Overlay sink busy, dropping frame {}", frame.index());
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::warn!("Overlay sink disconnected");
                    self.output = None;
                }
            }
        }
        self.last = Some(frame);
    }
}

impl Default for FrameRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for FrameRasterizer {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn set_background(&mut self, frame: &Frame, mirrored: bool) {
        self.background = Some(if mirrored {
            frame.mirrored()
        } else {
            frame.clone()
        });
    }

    fn render(
        &mut self,
        camera: &OrthographicCamera,
        scene: &[Group],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut img = self.canvas();
        if img.width() == 0 || img.height() == 0 {
            return Err("Nothing to render: viewport and background are empty".into());
        }

        for group in scene {
            for node in group.nodes() {
                match node {
                    SceneNode::Line(line) => Self::draw_polyline(&mut img, camera, line),
                    SceneNode::Points(cloud) => Self::draw_points(&mut img, camera, cloud),
                    SceneNode::Label(label) => self.draw_label(&mut img, camera, label),
                }
            }
        }

        let index = self.background.as_ref().map(|f| f.index()).unwrap_or(0);
        let (w, h) = img.dimensions();
        self.publish(Frame::new(img.into_raw(), w, h, index));
        Ok(())
    }
}

fn rgb(color: Color) -> Rgb<u8> {
    Rgb(color.to_array())
}

/// Draws `thickness` parallel one-pixel segments offset along the normal.
fn draw_thick_segment(
    img: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    thickness: i32,
    color: Rgb<u8>,
) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON || thickness <= 1 {
        draw_line_segment_mut(img, start, end, color);
        return;
    }
    let (nx, ny) = (-dy / len, dx / len);
    let half = (thickness - 1) as f32 / 2.0;
    for i in 0..thickness {
        let off = i as f32 - half;
        draw_line_segment_mut(
            img,
            (start.0 + nx * off, start.1 + ny * off),
            (end.0 + nx * off, end.1 + ny * off),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::domain::scene::Point2;

    fn gray_frame(w: u32, h: u32, index: usize) -> Frame {
        Frame::new(vec![128; (w * h * 3) as usize], w, h, index)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    #[test]
    fn test_render_without_background_or_viewport_fails() {
        let mut r = FrameRasterizer::new();
        let camera = OrthographicCamera::new(0, 0);
        assert!(r.render(&camera, &[]).is_err());
    }

    #[test]
    fn test_render_composites_line_over_background() {
        let mut r = FrameRasterizer::new();
        r.set_background(&gray_frame(100, 100, 4), false);
        let camera = OrthographicCamera::new(100, 100);
        let mut group = Group::new();
        // horizontal line through the centre
        group.add(SceneNode::Line(Polyline {
            points: vec![Point2::new(-40.0, 0.0), Point2::new(40.0, 0.0)],
            color: Color::PERSON,
            line_width: 0.03,
        }));

        r.render(&camera, &[group]).unwrap();

        let out = r.last_composite().unwrap();
        assert_eq!(out.index(), 4);
        assert_eq!(pixel(out, 50, 50), Color::PERSON.to_array());
        assert_eq!(pixel(out, 5, 5), [128, 128, 128]);
    }

    #[test]
    fn test_mirrored_background_is_flipped() {
        let mut data = vec![0u8; 6];
        data[0] = 255; // left pixel red
        let mut r = FrameRasterizer::new();
        r.set_background(&Frame::new(data, 2, 1, 0), true);
        r.render(&OrthographicCamera::new(2, 1), &[]).unwrap();
        let out = r.last_composite().unwrap();
        assert_eq!(pixel(out, 1, 0), [255, 0, 0]);
        assert_eq!(pixel(out, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_render_publishes_to_output_channel() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut r = FrameRasterizer::new().with_output(tx);
        r.set_viewport(20, 10);
        let camera = OrthographicCamera::new(20, 10);

        r.render(&camera, &[]).unwrap();
        // Channel full: second composite is dropped, not blocked on.
        r.render(&camera, &[]).unwrap();

        let frame = rx.try_recv().unwrap();
        assert_eq!((frame.width(), frame.height()), (20, 10));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_label_background_drawn_without_font() {
        let mut r = FrameRasterizer::new();
        r.set_background(&gray_frame(200, 200, 0), false);
        let camera = OrthographicCamera::new(200, 200);
        let mut group = Group::new();
        group.add(SceneNode::Label(Label {
            text: "cup 0.50".into(),
            anchor: Point2::new(-50.0, 50.0),
            color: Color::LABEL_TEXT,
            background: Color::OBJECT,
        }));

        r.render(&camera, &[group]).unwrap();

        // anchor maps to (50, 50); label box sits above it
        let out = r.last_composite().unwrap();
        assert_eq!(pixel(out, 52, 45), Color::OBJECT.to_array());
    }

    #[test]
    fn test_missing_font_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FrameRasterizer::new()
            .with_font_file(&dir.path().join("missing.ttf"))
            .is_err());
    }
}
