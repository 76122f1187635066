use crate::shared::frame::Frame;

use super::camera::OrthographicCamera;
use super::scene::Group;

/// Domain interface for whatever the overlay is drawn onto.
pub trait RenderTarget: Send {
    /// Called whenever the scene viewport changes size.
    fn set_viewport(&mut self, _width: u32, _height: u32) {}

    /// Video frame the overlay sits on top of.
    fn set_background(&mut self, _frame: &Frame, _mirrored: bool) {}

    fn render(
        &mut self,
        camera: &OrthographicCamera,
        scene: &[Group],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
