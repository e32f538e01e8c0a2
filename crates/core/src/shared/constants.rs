pub const DEFAULT_FPS: f64 = 30.0;
/// Frame rates are stored with millisecond precision as an `i32` rational.
pub const MIN_FPS: f64 = 0.001;
pub const MAX_FPS: f64 = i32::MAX as f64 / 1000.0;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_OUTPUT_FILE: &str = "output.mp4";

/// Resolution requested from capture devices. Drivers may pick the nearest mode.
pub const DEFAULT_CAPTURE_WIDTH: u32 = 1280;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 800;
pub const DEFAULT_INPUT_FORMAT: &str = "mjpeg";

/// V4L2 image controls written to the camera before capture.
pub const DEFAULT_GAMMA: i64 = 200;
pub const DEFAULT_GAIN: i64 = 0;
pub const DEFAULT_BRIGHTNESS: i64 = 0;
pub const DEFAULT_CONTRAST: i64 = 0;

pub const PREVIEW_WINDOW_TITLE: &str = "Press 'q' to quit";

/// Progress is logged every this many frames.
pub const PROGRESS_THROTTLE_FRAMES: usize = 30;
