/// A single captured frame: tightly packed RGB24 bytes in row-major order.
///
/// Pixel format conversion happens inside the ffmpeg adapters; the capture
/// loop forwards frames untouched.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of the frame in capture order, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes per row of the packed buffer.
    pub fn pitch(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Returns the bytes of a single row.
    pub fn row(&self, y: u32) -> &[u8] {
        let pitch = self.pitch();
        let start = y as usize * pitch;
        &self.data[start..start + pitch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_pitch_is_width_times_channels() {
        let frame = Frame::new(vec![0u8; 4 * 2 * 3], 4, 2, 3, 0);
        assert_eq!(frame.pitch(), 12);
    }

    #[test]
    fn test_row_returns_single_line() {
        // 2x2 RGB, second row filled with 7s
        let mut data = vec![0u8; 12];
        data[6..].fill(7);
        let frame = Frame::new(data, 2, 2, 3, 0);
        assert_eq!(frame.row(0), &[0, 0, 0, 0, 0, 0]);
        assert_eq!(frame.row(1), &[7, 7, 7, 7, 7, 7]);
    }
}
