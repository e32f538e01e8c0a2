use crate::shared::frame::Frame;

/// What the user asked for since the last poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    Continue,
    Quit,
}

/// A surface that renders frames as they are captured.
pub trait FrameDisplay {
    /// Creates the surface for frames of the given size.
    fn open(&mut self, width: u32, height: u32) -> Result<(), Box<dyn std::error::Error>>;

    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Drains pending input. Returns [`DisplayEvent::Quit`] when the user
    /// pressed the quit key or closed the window.
    fn poll(&mut self) -> DisplayEvent;

    /// Tears the surface down. Safe to call more than once.
    fn close(&mut self);
}
