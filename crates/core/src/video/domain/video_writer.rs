use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Abstracts video encoding so the capture loop can persist frames without
/// depending on a specific codec library.
pub trait VideoWriter {
    /// Creates (or truncates) `path`. `metadata.fps` is the output rate.
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes buffered packets and finalizes the container. Safe to call
    /// more than once.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
