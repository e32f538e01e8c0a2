pub mod frame_display;
pub mod video_reader;
pub mod video_writer;
