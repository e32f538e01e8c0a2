use std::path::PathBuf;

use thiserror::Error;

/// Terminal failures of a capture run. None of them are retried.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("unable to open video source {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write output video {path}: {reason}")]
    SinkUnavailable { path: PathBuf, reason: String },
    #[error("failed to grab frame: {0}")]
    RuntimeReadFailure(String),
    #[error("preview unavailable: {0}")]
    DisplayUnavailable(String),
}

impl CaptureError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn sink_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SinkUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
