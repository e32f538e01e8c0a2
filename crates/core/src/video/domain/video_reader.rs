use crate::capture::domain::capture_source::CaptureSource;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Pulls decoded frames from a video file or capture device.
///
/// Implementations handle container, codec and device details while the
/// capture loop only sees [`Frame`] and [`VideoMetadata`].
pub trait VideoReader {
    /// Opens the source and returns what it reports about itself.
    fn open(&mut self, source: &CaptureSource) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns the next frame, `Ok(None)` once the stream has ended cleanly.
    ///
    /// An `Err` means a frame could not be read; callers treat it as fatal.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the source. Safe to call more than once.
    fn close(&mut self);
}
