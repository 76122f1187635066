pub mod frame_rasterizer;
