use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::capture::domain::capture_config::CaptureConfig;
use crate::capture::domain::capture_error::CaptureError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_display::{DisplayEvent, FrameDisplay};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Why the capture loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    UserQuit,
}

/// Outcome of a successful capture run.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureSummary {
    pub frames_written: usize,
    pub stop_reason: StopReason,
    pub output_path: PathBuf,
    pub source: VideoMetadata,
}

/// Capture loop: source → sink (→ preview) until the stream ends or the
/// user quits.
///
/// The source, sink and display are released in that order on every exit
/// path, including setup failures after the source has been opened.
pub struct CaptureUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    display: Option<Box<dyn FrameDisplay>>,
    logger: Box<dyn PipelineLogger>,
}

impl CaptureUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        display: Option<Box<dyn FrameDisplay>>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            display,
            logger,
        }
    }

    /// Runs one capture to completion.
    pub fn execute(&mut self, config: &CaptureConfig) -> Result<CaptureSummary, CaptureError> {
        if config.show_preview() && self.display.is_none() {
            return Err(CaptureError::DisplayUnavailable(
                "this build has no preview support; rerun with --show false".into(),
            ));
        }

        let source = config.source();
        let metadata = match self.reader.open(source) {
            Ok(metadata) => metadata,
            Err(e) => {
                self.reader.close();
                return Err(CaptureError::source_unavailable(source.to_string(), e));
            }
        };

        self.logger.info(&format!(
            "Opened {}: {}x{} @ {:.2} fps ({})",
            metadata.source_name, metadata.width, metadata.height, metadata.fps, metadata.codec
        ));

        let result = self.run(config, &metadata);
        let finalized = self.release(config);

        let (stop_reason, frames_written) = match (result, finalized) {
            (Ok(outcome), Ok(())) => outcome,
            (Ok(_), Err(e)) | (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(close_err)) => {
                log::warn!("Output not finalized after failure: {close_err}");
                return Err(e);
            }
        };

        self.logger.summary();
        self.logger.info(&format!(
            "Output video saved at {}",
            config.output_path().display()
        ));

        Ok(CaptureSummary {
            frames_written,
            stop_reason,
            output_path: config.output_path().to_path_buf(),
            source: metadata,
        })
    }

    /// Everything between opening the source and releasing it: output
    /// directory, sink, display and the frame loop.
    fn run(
        &mut self,
        config: &CaptureConfig,
        metadata: &VideoMetadata,
    ) -> Result<(StopReason, usize), CaptureError> {
        let output_path = config.output_path();
        self.ensure_output_dir(config)?;

        let sink_metadata = metadata.with_fps(config.fps());
        self.writer
            .open(output_path, &sink_metadata)
            .map_err(|e| CaptureError::sink_unavailable(output_path, e))?;

        let mut display = match self.display.as_mut() {
            Some(display) if config.show_preview() => {
                display
                    .open(metadata.width, metadata.height)
                    .map_err(|e| CaptureError::DisplayUnavailable(e.to_string()))?;
                Some(display)
            }
            _ => None,
        };

        let mut frames_written = 0;
        let stop_reason = loop {
            let started = Instant::now();
            let frame = match self.reader.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => return Err(CaptureError::RuntimeReadFailure(e.to_string())),
            };
            self.logger.timing("read", elapsed_ms(started));

            let started = Instant::now();
            self.writer
                .write(&frame)
                .map_err(|e| CaptureError::sink_unavailable(output_path, e))?;
            self.logger.timing("write", elapsed_ms(started));

            frames_written += 1;
            self.logger.progress(frames_written, metadata.total_frames);

            if let Some(display) = display.as_deref_mut() {
                let started = Instant::now();
                display
                    .show(&frame)
                    .map_err(|e| CaptureError::DisplayUnavailable(e.to_string()))?;
                self.logger.timing("display", elapsed_ms(started));

                if display.poll() == DisplayEvent::Quit {
                    self.logger.info("Exit requested by user.");
                    break StopReason::UserQuit;
                }
            }
        };

        if stop_reason == StopReason::EndOfStream {
            self.logger.info("End of stream reached.");
        }

        Ok((stop_reason, frames_written))
    }

    fn ensure_output_dir(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        let Some(dir) = config.output_dir() else {
            return Ok(());
        };
        if dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|source| CaptureError::OutputDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        self.logger
            .info(&format!("Created output directory {}", dir.display()));
        Ok(())
    }

    /// Releases source, sink and display, in that order.
    fn release(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        self.reader.close();
        let finalized = self
            .writer
            .close()
            .map_err(|e| CaptureError::sink_unavailable(config.output_path(), e));
        if let Some(display) = self.display.as_mut() {
            display.close();
        }
        finalized
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
