use std::path::{Path, PathBuf};

use super::capture_error::CaptureError;
use super::capture_source::CaptureSource;
use crate::shared::constants::{
    DEFAULT_BRIGHTNESS, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_CONTRAST,
    DEFAULT_GAIN, DEFAULT_GAMMA, DEFAULT_INPUT_FORMAT, MAX_FPS, MIN_FPS,
};

/// Encoder used for the output file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputCodec {
    /// MPEG-4 Part 2, playable from an `.mp4` container almost everywhere.
    #[default]
    Mpeg4,
    /// Motion JPEG, intra-only. Best kept in `.avi` or `.mkv`.
    Mjpeg,
}

impl OutputCodec {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mpeg4 => "mpeg4",
            Self::Mjpeg => "mjpeg",
        }
    }
}

/// Image controls written to a V4L2 camera before streaming starts.
/// Values are in the driver's own units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraControls {
    pub gamma: i64,
    pub gain: i64,
    pub brightness: i64,
    pub contrast: i64,
}

impl Default for CameraControls {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            gain: DEFAULT_GAIN,
            brightness: DEFAULT_BRIGHTNESS,
            contrast: DEFAULT_CONTRAST,
        }
    }
}

/// Capture mode requested from a device. Ignored for file sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSettings {
    pub width: u32,
    pub height: u32,
    /// Device pixel format, e.g. `mjpeg` or `yuyv422`. Empty means driver default.
    pub input_format: String,
    /// `None` leaves the camera's current controls untouched.
    pub controls: Option<CameraControls>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
            input_format: DEFAULT_INPUT_FORMAT.to_string(),
            controls: Some(CameraControls::default()),
        }
    }
}

/// Immutable settings for one capture run, validated before any I/O.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    source: CaptureSource,
    fps: f64,
    output_path: PathBuf,
    show_preview: bool,
    device: DeviceSettings,
    codec: OutputCodec,
}

impl CaptureConfig {
    pub fn new(
        source: CaptureSource,
        fps: f64,
        output_path: PathBuf,
        show_preview: bool,
    ) -> Result<Self, CaptureError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(CaptureError::Configuration(format!(
                "frame rate must be greater than zero, got {fps}"
            )));
        }
        if !(MIN_FPS..=MAX_FPS).contains(&fps) {
            return Err(CaptureError::Configuration(format!(
                "frame rate must be between {MIN_FPS} and {MAX_FPS}, got {fps}"
            )));
        }
        if output_path.file_name().is_none() {
            return Err(CaptureError::Configuration(format!(
                "output path {} does not name a file",
                output_path.display()
            )));
        }
        Ok(Self {
            source,
            fps,
            output_path,
            show_preview,
            device: DeviceSettings::default(),
            codec: OutputCodec::default(),
        })
    }

    pub fn with_device_settings(mut self, device: DeviceSettings) -> Self {
        self.device = device;
        self
    }

    pub fn with_codec(mut self, codec: OutputCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn source(&self) -> &CaptureSource {
        &self.source
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    pub fn device(&self) -> &DeviceSettings {
        &self.device
    }

    pub fn codec(&self) -> OutputCodec {
        self.codec
    }

    /// Directory that must exist before the sink is opened.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Places `file` under `output_dir`. An absolute `file` wins.
pub fn resolve_output_path(output_dir: &Path, file: &Path) -> PathBuf {
    output_dir.join(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn config(fps: f64, output: &str) -> Result<CaptureConfig, CaptureError> {
        CaptureConfig::new(CaptureSource::Device(0), fps, PathBuf::from(output), false)
    }

    #[test]
    fn test_valid_config_keeps_values() {
        let cfg = config(24.0, "output/clip.mp4").unwrap();
        assert_eq!(cfg.source(), &CaptureSource::Device(0));
        assert_relative_eq!(cfg.fps(), 24.0);
        assert_eq!(cfg.output_path(), Path::new("output/clip.mp4"));
        assert!(!cfg.show_preview());
        assert_eq!(cfg.codec(), OutputCodec::Mpeg4);
        assert_eq!(cfg.device(), &DeviceSettings::default());
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-5.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    #[case::below_millisecond_precision(0.0004)]
    #[case::above_rational_range(1.0e7)]
    fn test_unusable_fps_rejected(#[case] fps: f64) {
        let err = config(fps, "output/clip.mp4").unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }

    #[test]
    fn test_output_path_without_file_name_rejected() {
        let err = config(30.0, "output/..").unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }

    #[test]
    fn test_output_dir_of_nested_path() {
        let cfg = config(30.0, "output/reports/demo.mp4").unwrap();
        assert_eq!(cfg.output_dir(), Some(Path::new("output/reports")));
    }

    #[test]
    fn test_output_dir_of_bare_file_is_none() {
        let cfg = config(30.0, "demo.mp4").unwrap();
        assert_eq!(cfg.output_dir(), None);
    }

    #[test]
    fn test_builders_override_defaults() {
        let device = DeviceSettings {
            width: 640,
            height: 480,
            input_format: "yuyv422".into(),
            controls: None,
        };
        let cfg = config(30.0, "a.avi")
            .unwrap()
            .with_device_settings(device.clone())
            .with_codec(OutputCodec::Mjpeg);
        assert_eq!(cfg.device(), &device);
        assert_eq!(cfg.codec(), OutputCodec::Mjpeg);
    }

    #[test]
    fn test_default_device_settings() {
        let device = DeviceSettings::default();
        assert_eq!((device.width, device.height), (1280, 800));
        assert_eq!(device.input_format, "mjpeg");
        assert_eq!(
            device.controls,
            Some(CameraControls {
                gamma: 200,
                gain: 0,
                brightness: 0,
                contrast: 0,
            })
        );
    }

    #[test]
    fn test_lowest_representable_fps_accepted() {
        let cfg = config(MIN_FPS, "output/clip.mp4").unwrap();
        assert_relative_eq!(cfg.fps(), 0.001);
    }

    #[rstest]
    #[case::plain("output", "output.mp4", "output/output.mp4")]
    #[case::nested("output", "reports/demo.mp4", "output/reports/demo.mp4")]
    #[case::absolute("output", "/tmp/demo.mp4", "/tmp/demo.mp4")]
    fn test_resolve_output_path(#[case] dir: &str, #[case] file: &str, #[case] expected: &str) {
        assert_eq!(
            resolve_output_path(Path::new(dir), Path::new(file)),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(OutputCodec::Mpeg4.name(), "mpeg4");
        assert_eq!(OutputCodec::Mjpeg.name(), "mjpeg");
    }
}
