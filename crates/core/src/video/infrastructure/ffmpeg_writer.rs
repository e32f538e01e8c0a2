use std::path::Path;

use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::capture::domain::capture_config::OutputCodec;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes RGB frames via ffmpeg-next and muxes them into the container
/// implied by the output file extension.
pub struct FfmpegWriter {
    codec: OutputCodec,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<scaling::Context>,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
    video_stream_index: usize,
}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            codec: OutputCodec::default(),
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: ffmpeg_next::Rational(1, 30),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    pub fn with_codec(mut self, codec: OutputCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Frames accepted by [`VideoWriter::write`] since the last open.
    pub fn frames_written(&self) -> usize {
        self.frame_count
    }

    /// Flushes the encoder and writes the trailer. No-op when not opened.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(());
        };
        encoder.send_eof()?;
        self.drain_packets()?;
        if let Some(octx) = self.octx.as_mut() {
            octx.write_trailer()?;
        }
        Ok(())
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Ok(());
        };
        let ost_time_base = octx
            .stream(self.video_stream_index)
            .ok_or("output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.video_stream_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        if metadata.width == 0 || metadata.height == 0 {
            return Err(format!(
                "source reported invalid frame size {}x{}",
                metadata.width, metadata.height
            )
            .into());
        }

        let frame_rate = fps_to_rational(metadata.fps)?;
        let time_base = frame_rate.invert();

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(codec_id(self.codec))
            .ok_or_else(|| format!("{} encoder not found", self.codec.name()))?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let pixel_format = encoder_pixel_format(self.codec);
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(pixel_format);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(frame_rate));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);
        self.video_stream_index = ost.index();

        octx.write_header()?;

        let scaler = scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            pixel_format,
            metadata.width,
            metadata.height,
            scaling::Flags::BILINEAR,
        )?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = time_base;
        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        log::debug!(
            "Opened {} for {}x{} {} at {}/{} fps",
            path.display(),
            metadata.width,
            metadata.height,
            self.codec.name(),
            frame_rate.numerator(),
            frame_rate.denominator()
        );

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let encoder = self.encoder.as_mut().ok_or("FfmpegWriter: not opened")?;
        let scaler = self.scaler.as_mut().ok_or("FfmpegWriter: not opened")?;

        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3 {
            return Err(format!(
                "frame {} is {}x{}x{}, writer expects {}x{}x3",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame =
            VideoFrame::new(ffmpeg_next::format::Pixel::RGB24, self.width, self.height);

        // Copy pixel data, respecting stride
        let stride = rgb_frame.stride(0);
        let pitch = frame.pitch();
        let data = rgb_frame.data_mut(0);
        for row in 0..self.height {
            let dst_start = row as usize * stride;
            data[dst_start..dst_start + pitch].copy_from_slice(frame.row(row));
        }

        let mut yuv_frame = VideoFrame::empty();
        scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&yuv_frame)?;
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let result = self.finish();

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        result
    }
}

fn codec_id(codec: OutputCodec) -> ffmpeg_next::codec::Id {
    match codec {
        OutputCodec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
        OutputCodec::Mjpeg => ffmpeg_next::codec::Id::MJPEG,
    }
}

fn encoder_pixel_format(codec: OutputCodec) -> ffmpeg_next::format::Pixel {
    match codec {
        OutputCodec::Mpeg4 => ffmpeg_next::format::Pixel::YUV420P,
        OutputCodec::Mjpeg => ffmpeg_next::format::Pixel::YUVJ420P,
    }
}

/// Converts a frame rate to a rational with millisecond precision.
///
/// MPEG-4 caps the time base denominator at 65535, so common NTSC rates must
/// come out as e.g. 2997/100 rather than a large continued-fraction result.
fn fps_to_rational(fps: f64) -> Result<ffmpeg_next::Rational, Box<dyn std::error::Error>> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("frame rate must be greater than zero, got {fps}").into());
    }
    let scaled = (fps * 1000.0).round();
    if scaled < 1.0 || scaled > i32::MAX as f64 {
        return Err(format!("frame rate {fps} is out of range").into());
    }
    let num = scaled as i32;
    let den = 1000;
    let g = gcd(num, den);
    Ok(ffmpeg_next::Rational(num / g, den / g))
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_source::CaptureSource;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use rstest::rstest;

    fn metadata(w: u32, h: u32, fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: w,
            height: h,
            fps,
            total_frames: 0,
            codec: String::new(),
            source_name: String::new(),
        }
    }

    fn solid_frame(index: usize, w: u32, h: u32, value: u8) -> Frame {
        let data = vec![value; (w * h * 3) as usize];
        Frame::new(data, w, h, 3, index)
    }

    fn count_frames(path: &Path) -> usize {
        let mut reader = FfmpegReader::new();
        reader.open(&CaptureSource::File(path.to_path_buf())).unwrap();
        let mut count = 0;
        while reader.next_frame().unwrap().is_some() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        assert_eq!(writer.frames_written(), 3);
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_written_video_has_resolution_and_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 15.0)).unwrap();
        for i in 0..4 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&CaptureSource::File(path)).unwrap();
        assert_eq!(meta.width, 160);
        assert_eq!(meta.height, 120);
        approx::assert_relative_eq!(meta.fps, 15.0, epsilon = 0.01);
    }

    #[test]
    fn test_roundtrip_preserves_frame_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        for i in 0..10 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        assert_eq!(count_frames(&path), 10);
    }

    #[test]
    fn test_reopen_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("again.mp4");

        for frames in [8, 2] {
            let mut writer = FfmpegWriter::new();
            writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
            for i in 0..frames {
                writer.write(&solid_frame(i, 160, 120, 64)).unwrap();
            }
            writer.close().unwrap();
        }

        assert_eq!(count_frames(&path), 2);
    }

    #[test]
    fn test_mjpeg_in_avi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.avi");

        let mut writer = FfmpegWriter::new().with_codec(OutputCodec::Mjpeg);
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 200)).unwrap();
        }
        writer.close().unwrap();

        assert_eq!(count_frames(&path), 3);
    }

    #[test]
    fn test_unknown_container_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.notacontainer");

        let mut writer = FfmpegWriter::new();
        assert!(writer.open(&path, &metadata(160, 120, 30.0)).is_err());
    }

    #[test]
    fn test_zero_size_metadata_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        assert!(writer.open(&path, &metadata(0, 0, 30.0)).is_err());
    }

    #[test]
    fn test_write_without_open_returns_error() {
        let mut writer = FfmpegWriter::new();
        assert!(writer.write(&solid_frame(0, 160, 120, 128)).is_err());
    }

    #[test]
    fn test_write_rejects_mismatched_frame_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        assert!(writer.write(&solid_frame(0, 80, 60, 128)).is_err());
        writer.close().unwrap();
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        writer.write(&solid_frame(0, 160, 120, 128)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
    }

    #[rstest]
    #[case::integer(30.0, 30, 1)]
    #[case::ntsc(29.97, 2997, 100)]
    #[case::film(23.976, 2997, 125)]
    #[case::fractional(0.5, 1, 2)]
    fn test_fps_to_rational(#[case] fps: f64, #[case] num: i32, #[case] den: i32) {
        let r = fps_to_rational(fps).unwrap();
        assert_eq!((r.numerator(), r.denominator()), (num, den));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::too_small(0.0001)]
    fn test_fps_to_rational_rejects(#[case] fps: f64) {
        assert!(fps_to_rational(fps).is_err());
    }
}
