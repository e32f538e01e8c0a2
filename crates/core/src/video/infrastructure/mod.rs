pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
#[cfg(feature = "preview")]
pub mod sdl_display;
#[cfg(target_os = "linux")]
pub mod v4l_controls;
