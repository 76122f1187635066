pub mod camera;
pub mod color;
pub mod coordinate_mapper;
pub mod face_landmark_painter;
pub mod face_painter;
pub mod gesture_painter;
pub mod object_painter;
pub mod overlay_painter;
pub mod render_surface;
pub mod render_target;
pub mod scene;
pub mod tesselation;
