//! Capture a video file or camera to disk, with an optional live preview.
//!
//! `video::domain` defines the ports the capture loop talks to,
//! `video::infrastructure` implements them with ffmpeg and SDL, and
//! `pipeline::capture_use_case` drives the loop.

pub mod capture;
pub mod pipeline;
pub mod shared;
pub mod video;
