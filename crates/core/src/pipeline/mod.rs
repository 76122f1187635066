pub mod frame_loop;
pub mod infrastructure;
pub mod loop_logger;
pub mod overlay_controller;
