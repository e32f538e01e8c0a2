use std::fmt;
use std::path::{Path, PathBuf};

use super::capture_error::CaptureError;

/// Where frames come from: a video file or a numbered capture device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureSource {
    File(PathBuf),
    Device(u32),
}

impl CaptureSource {
    /// Builds a source from the two mutually exclusive selectors.
    ///
    /// Exactly one of `video` and `cam` must be set.
    pub fn from_selectors(video: Option<&Path>, cam: Option<u32>) -> Result<Self, CaptureError> {
        match (video, cam) {
            (Some(path), None) => Ok(Self::File(path.to_path_buf())),
            (None, Some(index)) => Ok(Self::Device(index)),
            (Some(_), Some(_)) => Err(CaptureError::Configuration(
                "--video and --cam are mutually exclusive".into(),
            )),
            (None, None) => Err(CaptureError::Configuration(
                "you must specify either --video or --cam".into(),
            )),
        }
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Device(index) => write!(f, "camera {index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_video_only_selects_file() {
        let source = CaptureSource::from_selectors(Some(Path::new("clip.mp4")), None).unwrap();
        assert_eq!(source, CaptureSource::File(PathBuf::from("clip.mp4")));
    }

    #[test]
    fn test_cam_only_selects_device() {
        let source = CaptureSource::from_selectors(None, Some(2)).unwrap();
        assert_eq!(source, CaptureSource::Device(2));
    }

    #[rstest]
    #[case::both(Some(Path::new("clip.mp4")), Some(0))]
    #[case::neither(None, None)]
    fn test_invalid_selectors_are_configuration_errors(
        #[case] video: Option<&Path>,
        #[case] cam: Option<u32>,
    ) {
        let err = CaptureSource::from_selectors(video, cam).unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(CaptureSource::Device(0).to_string(), "camera 0");
        assert_eq!(
            CaptureSource::File(PathBuf::from("in/a.mp4")).to_string(),
            "in/a.mp4"
        );
    }
}
