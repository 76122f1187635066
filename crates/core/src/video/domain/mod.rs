pub mod image_writer;
pub mod overlay_sink;
pub mod video_writer;
