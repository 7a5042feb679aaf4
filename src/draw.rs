// Window surface: shows the tone-mapped composite and reports input.
// The composite is pushed at full resolution; minifb stretches it to the
// window, keeping the aspect ratio.

use std::time::Duration;

use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};

use crate::controller::InputState;
use crate::error::{Error, Result};
use crate::types::FrameBuffer;

// `1`..`9` then `0`, matching channel 0..9.
const CHANNEL_KEYS: [Key; 10] = [
    Key::Key1,
    Key::Key2,
    Key::Key3,
    Key::Key4,
    Key::Key5,
    Key::Key6,
    Key::Key7,
    Key::Key8,
    Key::Key9,
    Key::Key0,
];

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Open a window `height` pixels tall with the composite's aspect ratio.
    pub fn new(title: &str, image_size: (usize, usize), height: usize) -> Result<Self> {
        let (w, h) = image_size;
        let width = ((w as f64 / h as f64) * height as f64).round().max(1.0) as usize;
        let options = WindowOptions {
            resize: true,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        };
        let window = Window::new(title, width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen (also pumps window events).
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down (we’ll exit when this is pressed).
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Snapshot the input gathered by the last `present`.
    pub fn input(&self, dt: Duration) -> InputState {
        let scroll = self.window.get_scroll_wheel().map_or(0.0, |(_, dy)| dy);
        let channel_keys = CHANNEL_KEYS
            .iter()
            .enumerate()
            .filter(|(_, k)| self.window.is_key_pressed(**k, KeyRepeat::No))
            .map(|(i, _)| i)
            .collect();
        InputState { scroll, channel_keys, dt }
    }
}
