use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Texture, TextureCreator, TextureValueError, WindowCanvas};
use sdl2::video::WindowContext;

use crate::shared::frame::Frame;
use crate::video::domain::frame_display::{DisplayEvent, FrameDisplay};

/// Live preview window backed by SDL2.
pub struct SdlDisplay {
    title: String,
    window: Option<SdlWindow>,
}

// Field order is drop order: the renderer goes before the SDL context.
struct SdlWindow {
    texture: Option<StreamingTexture>,
    canvas: WindowCanvas,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: sdl2::EventPump,
    _video: sdl2::VideoSubsystem,
    _sdl: sdl2::Sdl,
}

/// RGB24 texture reused across frames of the same size.
struct StreamingTexture {
    texture: Texture,
    width: u32,
    height: u32,
}

impl SdlWindow {
    /// Makes sure the streaming texture matches the frame size, recreating
    /// it only when the size changes.
    fn ensure_texture(&mut self, width: u32, height: u32) -> Result<(), TextureValueError> {
        let current = self.texture.as_ref().map(|t| (t.width, t.height));
        if !needs_new_texture(current, width, height) {
            return Ok(());
        }
        self.destroy_texture();
        let texture =
            self.texture_creator
                .create_texture_streaming(PixelFormatEnum::RGB24, width, height)?;
        self.texture = Some(StreamingTexture {
            texture,
            width,
            height,
        });
        Ok(())
    }

    fn destroy_texture(&mut self) {
        if let Some(streaming) = self.texture.take() {
            // SAFETY: the renderer that created the texture is owned by
            // `self.canvas` and is still alive.
            unsafe { streaming.texture.destroy() };
        }
    }
}

impl Drop for SdlWindow {
    fn drop(&mut self) {
        self.destroy_texture();
    }
}

impl SdlDisplay {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: None,
        }
    }
}

impl FrameDisplay for SdlDisplay {
    fn open(&mut self, width: u32, height: u32) -> Result<(), Box<dyn std::error::Error>> {
        let sdl = sdl2::init()?;
        let video = sdl.video()?;
        let window = video
            .window(&self.title, width, height)
            .position_centered()
            .resizable()
            .build()?;
        let canvas = window.into_canvas().build()?;
        let texture_creator = canvas.texture_creator();
        let event_pump = sdl.event_pump()?;

        let mut window = SdlWindow {
            texture: None,
            canvas,
            texture_creator,
            event_pump,
            _video: video,
            _sdl: sdl,
        };
        window.ensure_texture(width, height)?;
        self.window = Some(window);
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let window = self.window.as_mut().ok_or("SdlDisplay: not opened")?;

        window.ensure_texture(frame.width(), frame.height())?;
        let streaming = window
            .texture
            .as_mut()
            .ok_or("SdlDisplay: no streaming texture")?;
        streaming
            .texture
            .update(None, frame.data(), frame.pitch())?;

        window.canvas.clear();
        window.canvas.copy(&streaming.texture, None, None)?;
        window.canvas.present();
        Ok(())
    }

    fn poll(&mut self) -> DisplayEvent {
        let Some(window) = self.window.as_mut() else {
            return DisplayEvent::Continue;
        };

        let mut result = DisplayEvent::Continue;
        for event in window.event_pump.poll_iter() {
            if requests_quit(&event) {
                result = DisplayEvent::Quit;
            }
        }
        result
    }

    fn close(&mut self) {
        self.window = None;
    }
}

fn requests_quit(event: &Event) -> bool {
    match event {
        Event::Quit { .. } => true,
        Event::Window {
            win_event: WindowEvent::Close,
            ..
        } => true,
        Event::KeyDown { keycode, .. } => is_quit_key(*keycode),
        _ => false,
    }
}

fn needs_new_texture(current: Option<(u32, u32)>, width: u32, height: u32) -> bool {
    current != Some((width, height))
}

fn is_quit_key(keycode: Option<Keycode>) -> bool {
    keycode == Some(Keycode::Q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q_quits() {
        assert!(is_quit_key(Some(Keycode::Q)));
    }

    #[test]
    fn test_other_keys_do_not_quit() {
        assert!(!is_quit_key(Some(Keycode::W)));
        assert!(!is_quit_key(Some(Keycode::Escape)));
        assert!(!is_quit_key(None));
    }

    #[test]
    fn test_quit_event_quits() {
        assert!(requests_quit(&Event::Quit { timestamp: 0 }));
    }

    #[test]
    fn test_texture_reused_for_same_size() {
        assert!(!needs_new_texture(Some((640, 480)), 640, 480));
    }

    #[test]
    fn test_texture_recreated_on_resize_or_first_use() {
        assert!(needs_new_texture(None, 640, 480));
        assert!(needs_new_texture(Some((640, 480)), 1280, 720));
    }

    #[test]
    fn test_unopened_display() {
        let mut display = SdlDisplay::new("preview");
        assert_eq!(display.poll(), DisplayEvent::Continue);
        assert!(display.show(&Frame::new(vec![0; 12], 2, 2, 3, 0)).is_err());
        display.close();
    }
}
