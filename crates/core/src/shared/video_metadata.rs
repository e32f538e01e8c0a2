#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Zero when the source cannot tell, e.g. a live device.
    pub total_frames: usize,
    pub codec: String,
    /// Human-readable source description (file path or device URL).
    pub source_name: String,
}

impl VideoMetadata {
    /// Copy of this metadata with the frame rate replaced.
    ///
    /// The sink encodes at the configured rate, not the rate the source
    /// reports.
    pub fn with_fps(&self, fps: f64) -> Self {
        Self {
            fps,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 1280,
            height: 800,
            fps: 25.0,
            total_frames: 0,
            codec: "mjpeg".to_string(),
            source_name: "/dev/video0".to_string(),
        }
    }

    #[test]
    fn test_construction() {
        let meta = metadata();
        assert_eq!(meta.width, 1280);
        assert_eq!(meta.height, 800);
        assert_eq!(meta.total_frames, 0);
        assert_eq!(meta.codec, "mjpeg");
        assert_eq!(meta.source_name, "/dev/video0");
    }

    #[test]
    fn test_with_fps_replaces_only_rate() {
        let meta = metadata();
        let out = meta.with_fps(30.0);
        assert_relative_eq!(out.fps, 30.0);
        assert_eq!(out.width, meta.width);
        assert_eq!(out.height, meta.height);
        assert_eq!(out.codec, meta.codec);
        assert_relative_eq!(meta.fps, 25.0);
    }
}
