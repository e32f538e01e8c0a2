use std::path::PathBuf;
use std::process;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};

use monocap_core::capture::domain::capture_config::{
    resolve_output_path, CameraControls, CaptureConfig, DeviceSettings, OutputCodec,
};
use monocap_core::capture::domain::capture_error::CaptureError;
use monocap_core::capture::domain::capture_source::CaptureSource;
use monocap_core::pipeline::capture_use_case::{CaptureSummary, CaptureUseCase, StopReason};
use monocap_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use monocap_core::shared::constants::{
    DEFAULT_BRIGHTNESS, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_CONTRAST,
    DEFAULT_FPS, DEFAULT_GAIN, DEFAULT_GAMMA, DEFAULT_INPUT_FORMAT, DEFAULT_OUTPUT_DIR,
    DEFAULT_OUTPUT_FILE, PROGRESS_THROTTLE_FRAMES,
};
use monocap_core::video::domain::frame_display::FrameDisplay;
use monocap_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use monocap_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Capture and store video from a webcam or a video file.
#[derive(Parser, Debug)]
#[command(name = "monocap")]
struct Cli {
    /// Path to an input video file.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Camera index for webcam input.
    #[arg(long)]
    cam: Option<u32>,

    /// Frames per second of the output video.
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: f64,

    /// Output filename, placed under --output-dir.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    out: PathBuf,

    /// Directory the output file is written to (created if absent).
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Show a live preview window (true/false).
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    show: bool,

    /// Capture width requested from the camera.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_WIDTH)]
    width: u32,

    /// Capture height requested from the camera.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_HEIGHT)]
    height: u32,

    /// Pixel format requested from the camera (e.g. mjpeg, yuyv422).
    #[arg(long, default_value = DEFAULT_INPUT_FORMAT)]
    input_format: String,

    /// Camera gamma (V4L2 devices only).
    #[arg(long, default_value_t = DEFAULT_GAMMA, allow_negative_numbers = true)]
    gamma: i64,

    /// Camera gain (V4L2 devices only).
    #[arg(long, default_value_t = DEFAULT_GAIN, allow_negative_numbers = true)]
    gain: i64,

    /// Camera brightness (V4L2 devices only).
    #[arg(long, default_value_t = DEFAULT_BRIGHTNESS, allow_negative_numbers = true)]
    brightness: i64,

    /// Camera contrast (V4L2 devices only).
    #[arg(long, default_value_t = DEFAULT_CONTRAST, allow_negative_numbers = true)]
    contrast: i64,

    /// Leave the camera's image controls as they are.
    #[arg(long)]
    keep_camera_controls: bool,

    /// Encoder for the output file.
    #[arg(long, value_enum, default_value_t = Codec::Mpeg4)]
    codec: Codec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Codec {
    Mpeg4,
    Mjpeg,
}

impl From<Codec> for OutputCodec {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::Mpeg4 => OutputCodec::Mpeg4,
            Codec::Mjpeg => OutputCodec::Mjpeg,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let summary = capture(&cli)?;

    match summary.stop_reason {
        StopReason::UserQuit => log::info!(
            "Stopped by user after {} frames from {}",
            summary.frames_written,
            summary.source.source_name
        ),
        StopReason::EndOfStream => log::info!(
            "{} exhausted after {} frames",
            summary.source.source_name,
            summary.frames_written
        ),
    }
    Ok(())
}

fn capture(cli: &Cli) -> Result<CaptureSummary, CaptureError> {
    let config = build_config(cli)?;

    let reader = FfmpegReader::new()
        .with_device_settings(config.device().clone())
        .with_requested_fps(config.fps());
    let writer = FfmpegWriter::new().with_codec(config.codec());
    let display = build_display(config.show_preview());
    let logger = StdoutPipelineLogger::new(PROGRESS_THROTTLE_FRAMES);

    let mut use_case =
        CaptureUseCase::new(Box::new(reader), Box::new(writer), display, Box::new(logger));
    use_case.execute(&config)
}

fn build_config(cli: &Cli) -> Result<CaptureConfig, CaptureError> {
    let source = CaptureSource::from_selectors(cli.video.as_deref(), cli.cam)?;
    let output_path = resolve_output_path(&cli.output_dir, &cli.out);
    let device = DeviceSettings {
        width: cli.width,
        height: cli.height,
        input_format: cli.input_format.clone(),
        controls: (!cli.keep_camera_controls).then_some(CameraControls {
            gamma: cli.gamma,
            gain: cli.gain,
            brightness: cli.brightness,
            contrast: cli.contrast,
        }),
    };

    Ok(CaptureConfig::new(source, cli.fps, output_path, cli.show)?
        .with_device_settings(device)
        .with_codec(cli.codec.into()))
}

#[cfg(feature = "preview")]
fn build_display(show: bool) -> Option<Box<dyn FrameDisplay>> {
    use monocap_core::shared::constants::PREVIEW_WINDOW_TITLE;
    use monocap_core::video::infrastructure::sdl_display::SdlDisplay;

    show.then(|| Box::new(SdlDisplay::new(PREVIEW_WINDOW_TITLE)) as Box<dyn FrameDisplay>)
}

#[cfg(not(feature = "preview"))]
fn build_display(_show: bool) -> Option<Box<dyn FrameDisplay>> {
    None
}
