pub mod ffmpeg_writer;
pub mod image_file_writer;
pub mod overlay_recorder;
