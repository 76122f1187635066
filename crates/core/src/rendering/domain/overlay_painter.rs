use crate::detection::domain::adapter_config::AdapterConfig;
use crate::detection::domain::detection_result::DetectionResult;

use super::render_surface::RenderSurface;

/// Turns one mode's detection result into overlay geometry.
///
/// Every implementation clears the surface before adding its own group and
/// renders afterwards, even when there is nothing to draw, so only the
/// latest draw stays visible.
pub trait OverlayPainter: Send + Sync {
    fn paint(
        &self,
        surface: &mut RenderSurface,
        config: &AdapterConfig,
        mirrored: bool,
        result: &DetectionResult,
        width: u32,
        height: u32,
    );
}
