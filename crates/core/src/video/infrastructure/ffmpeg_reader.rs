use std::ffi::CString;

use ffmpeg_next::format::context::{Context, Input};
use ffmpeg_next::format::format::Format;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::capture::domain::capture_config::DeviceSettings;
use crate::capture::domain::capture_source::CaptureSource;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
#[cfg(target_os = "linux")]
use crate::video::infrastructure::v4l_controls;

/// Decodes frames from a file (libavformat) or a capture device
/// (libavdevice) and converts each one to RGB24.
pub struct FfmpegReader {
    device: DeviceSettings,
    requested_fps: Option<f64>,
    state: Option<DecodeState>,
}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            device: DeviceSettings::default(),
            requested_fps: None,
            state: None,
        }
    }

    /// Capture mode requested when the source is a device.
    pub fn with_device_settings(mut self, device: DeviceSettings) -> Self {
        self.device = device;
        self
    }

    /// Frame rate requested when the source is a device.
    pub fn with_requested_fps(mut self, fps: f64) -> Self {
        self.requested_fps = Some(fps);
        self
    }

    fn open_input(
        &self,
        source: &CaptureSource,
    ) -> Result<(Input, String), Box<dyn std::error::Error>> {
        match source {
            CaptureSource::File(path) => {
                let ictx = ffmpeg_next::format::input(path)?;
                Ok((ictx, path.display().to_string()))
            }
            CaptureSource::Device(index) => self.open_device(*index),
        }
    }

    fn open_device(&self, index: u32) -> Result<(Input, String), Box<dyn std::error::Error>> {
        ffmpeg_next::device::register_all();

        let (backend, url) =
            device_url(index).ok_or("camera capture is not supported on this platform")?;
        let format = find_input_format(backend)
            .ok_or_else(|| format!("ffmpeg was built without the {backend} input device"))?;

        self.apply_camera_controls(index);

        let options = device_options(backend, &self.device, self.requested_fps);
        let ctx = ffmpeg_next::format::open_with(&url, &format, options)?;

        match ctx {
            Context::Input(ictx) => Ok((ictx, url)),
            Context::Output(_) => Err(format!("{url} opened as an output").into()),
        }
    }

    /// Writes the configured image controls to the camera and logs what the
    /// driver kept. A camera that rejects them is still captured from.
    #[cfg(target_os = "linux")]
    fn apply_camera_controls(&self, index: u32) {
        let Some(controls) = &self.device.controls else {
            return;
        };
        match v4l_controls::apply_camera_controls(index, controls) {
            Ok(readings) => log::info!(
                "Camera controls: {}",
                v4l_controls::describe_readings(&readings)
            ),
            Err(e) => log::debug!("Skipping camera controls for /dev/video{index}: {e}"),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn apply_camera_controls(&self, _index: u32) {
        if self.device.controls.is_some() {
            log::debug!("Camera controls are only applied to V4L2 devices");
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &CaptureSource) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let (ictx, source_name) = self.open_input(source)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let fps = rational_to_f64(stream.rate())
            .or_else(|| rational_to_f64(stream.avg_frame_rate()))
            .unwrap_or(0.0);

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_name,
        };

        self.state = Some(DecodeState {
            ictx,
            decoder,
            scaler: None,
            video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        });

        Ok(metadata)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("FfmpegReader: not opened")?;
        state.next_frame()
    }

    fn close(&mut self) {
        self.state = None;
    }
}

/// Decoder state for one open source. Frames are decoded one at a time so
/// nothing beyond the current frame is buffered.
struct DecodeState {
    ictx: Input,
    decoder: ffmpeg_next::decoder::Video,
    // Built from the first decoded frame: device decoders (MJPEG in
    // particular) only know their pixel format once a frame is out.
    scaler: Option<scaling::Context>,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl DecodeState {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }

            if self.flushing {
                self.done = true;
                return Ok(None);
            }

            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.ictx) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    self.decoder.send_eof()?;
                    self.flushing = true;
                    continue;
                }
                Err(e) => return Err(Box::new(e)),
            }

            if packet.stream() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = VideoFrame::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let width = decoded.width();
        let height = decoded.height();
        let scaler = match &mut self.scaler {
            Some(scaler) => scaler,
            slot @ None => slot.insert(scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?),
        };

        let mut rgb_frame = VideoFrame::empty();
        scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// Input device backend and URL for a camera index on this platform.
fn device_url(index: u32) -> Option<(&'static str, String)> {
    if cfg!(target_os = "linux") {
        Some(("v4l2", format!("/dev/video{index}")))
    } else if cfg!(target_os = "macos") {
        Some(("avfoundation", index.to_string()))
    } else {
        None
    }
}

/// Looks up a registered demuxer or input device by short name. `None` when
/// this ffmpeg build lacks it, including builds with no capture devices.
fn find_input_format(name: &str) -> Option<Format> {
    let name = CString::new(name).ok()?;
    // SAFETY: the returned pointer is null or a static registry entry.
    unsafe {
        #[allow(clippy::unnecessary_cast)]
        let ptr = ffmpeg_next::ffi::av_find_input_format(name.as_ptr())
            as *mut ffmpeg_next::ffi::AVInputFormat;
        if ptr.is_null() {
            None
        } else {
            Some(Format::Input(ffmpeg_next::format::Input::wrap(ptr)))
        }
    }
}

/// Capture options for the device demuxer. The driver is free to pick the
/// nearest supported mode.
fn device_options(
    backend: &str,
    device: &DeviceSettings,
    fps: Option<f64>,
) -> ffmpeg_next::Dictionary<'static> {
    let mut options = ffmpeg_next::Dictionary::new();
    if device.width > 0 && device.height > 0 {
        options.set("video_size", &format!("{}x{}", device.width, device.height));
    }
    if let Some(fps) = fps {
        options.set("framerate", &fps.to_string());
    }
    // avfoundation names pixel formats differently and has no compressed modes
    if !device.input_format.is_empty() && backend.contains("v4l2") {
        options.set("input_format", &device.input_format);
    }
    options
}

fn rational_to_f64(rate: ffmpeg_next::Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    } else {
        None
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(rgb_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
