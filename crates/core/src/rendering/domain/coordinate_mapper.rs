//! Maps detector pixel coordinates into camera space.
//!
//! Unmirrored x grows rightwards from the camera's left bound; mirrored x
//! grows leftwards from the right bound. In both cases y descends from the
//! top bound, so the two mappings are reflections about the camera's
//! horizontal midpoint.

use crate::detection::domain::detection_result::{BoundingBox, NormalizedLandmark};

use super::camera::OrthographicCamera;
use super::scene::Point2;

pub fn map_x(camera: &OrthographicCamera, x: f32, mirrored: bool) -> f32 {
    if mirrored {
        camera.right() - x
    } else {
        camera.left() + x
    }
}

pub fn map_point(camera: &OrthographicCamera, x: f32, y: f32, mirrored: bool) -> Point2 {
    Point2::new(map_x(camera, x, mirrored), camera.top() - y)
}

/// Closed outline of a box: four corners followed by the first again.
pub fn box_outline(camera: &OrthographicCamera, bbox: &BoundingBox, mirrored: bool) -> Vec<Point2> {
    let dx = if mirrored { -bbox.width } else { bbox.width };
    let x0 = map_x(camera, bbox.origin_x, mirrored);
    let y0 = camera.top() - bbox.origin_y;
    let corners = [
        Point2::new(x0, y0),
        Point2::new(x0 + dx, y0),
        Point2::new(x0 + dx, y0 - bbox.height),
        Point2::new(x0, y0 - bbox.height),
    ];
    [0usize, 1, 2, 3, 0].iter().map(|&i| corners[i]).collect()
}

/// Visual top-left corner of a box after mirroring.
pub fn box_top_left(camera: &OrthographicCamera, bbox: &BoundingBox, mirrored: bool) -> Point2 {
    let left_edge = if mirrored {
        map_x(camera, bbox.origin_x + bbox.width, true)
    } else {
        map_x(camera, bbox.origin_x, false)
    };
    Point2::new(left_edge, camera.top() - bbox.origin_y)
}

/// Maps a normalized landmark using the frame's pixel size.
pub fn landmark_point(
    camera: &OrthographicCamera,
    landmark: &NormalizedLandmark,
    width: u32,
    height: u32,
    mirrored: bool,
) -> Point2 {
    map_point(
        camera,
        landmark.x * width as f32,
        landmark.y * height as f32,
        mirrored,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn camera() -> OrthographicCamera {
        OrthographicCamera::new(640, 480)
    }

    #[test]
    fn test_unmirrored_outline_starts_at_left_bound_plus_offset() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 100.0);
        let pts = box_outline(&camera(), &bbox, false);

        assert_eq!(pts.len(), 5);
        assert_relative_eq!(pts[0].x, -320.0 + 100.0);
        assert_relative_eq!(pts[0].y, 240.0 - 50.0);
        assert_relative_eq!(pts[1].x, -320.0 + 300.0);
        assert_relative_eq!(pts[2].y, 240.0 - 150.0);
        assert_relative_eq!(pts[3].x, -320.0 + 100.0);
        assert_eq!(pts[4], pts[0]);
    }

    #[test]
    fn test_mirrored_outline_starts_at_right_bound_minus_offset() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 100.0);
        let pts = box_outline(&camera(), &bbox, true);

        assert_relative_eq!(pts[0].x, 320.0 - 100.0);
        assert_relative_eq!(pts[1].x, 320.0 - 300.0);
        assert_relative_eq!(pts[1].y, 240.0 - 50.0);
        assert_relative_eq!(pts[2].y, 240.0 - 150.0);
        assert_eq!(pts[4], pts[0]);
    }

    #[rstest]
    #[case(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 640, 480)]
    #[case(BoundingBox::new(123.5, 40.0, 77.0, 310.0), 640, 480)]
    #[case(BoundingBox::new(500.0, 300.0, 140.0, 20.0), 1280, 720)]
    fn test_mirrored_is_reflection_about_midpoint(
        #[case] bbox: BoundingBox,
        #[case] w: u32,
        #[case] h: u32,
    ) {
        let camera = OrthographicCamera::new(w, h);
        let plain = box_outline(&camera, &bbox, false);
        let mirrored = box_outline(&camera, &bbox, true);
        let c = camera.center_x();

        for (p, m) in plain.iter().zip(&mirrored) {
            assert_relative_eq!(m.x, 2.0 * c - p.x, epsilon = 1e-4);
            assert_relative_eq!(m.y, p.y);
        }
    }

    #[test]
    fn test_box_top_left_is_visual_left_edge() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 100.0);
        let plain = box_top_left(&camera(), &bbox, false);
        let mirrored = box_top_left(&camera(), &bbox, true);
        assert_relative_eq!(plain.x, -220.0);
        assert_relative_eq!(mirrored.x, 320.0 - 300.0);
        assert_relative_eq!(mirrored.y, 190.0);
    }

    #[test]
    fn test_landmark_point_scales_by_frame_size() {
        let lm = NormalizedLandmark::new(0.25, 0.5, 0.0);
        let p = landmark_point(&camera(), &lm, 640, 480, false);
        assert_relative_eq!(p.x, -320.0 + 160.0);
        assert_relative_eq!(p.y, 0.0);
    }
}
