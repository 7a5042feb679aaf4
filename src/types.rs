// Core pixel containers shared by the compositing pipeline.
// All linear buffers store rows bottom-up (row 0 is the bottom of the picture),
// the same order a texture upload would use. Only the window and the encoder
// see top-down rows.

use std::ops::{Add, Sub};

/// One RGB triple: a linear radiance sample or a per-channel intensity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const ZERO: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Same value on all three channels (scalar controllers broadcast this way).
    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    #[inline]
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self { r: f(self.r), g: f(self.g), b: f(self.b) }
    }

    /// Per-channel product (intensity × radiance).
    #[inline]
    pub fn scale(self, by: Rgb) -> Self {
        Self { r: self.r * by.r, g: self.g * by.g, b: self.b * by.b }
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Add for Rgb {
    type Output = Rgb;
    #[inline]
    fn add(self, o: Rgb) -> Rgb {
        Rgb { r: self.r + o.r, g: self.g + o.g, b: self.b + o.b }
    }
}

impl Sub for Rgb {
    type Output = Rgb;
    #[inline]
    fn sub(self, o: Rgb) -> Rgb {
        Rgb { r: self.r - o.r, g: self.g - o.g, b: self.b - o.b }
    }
}

/// Linear-radiance image, bottom-up rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LightBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgb>, // length = width * height
}

impl LightBuffer {
    /// All-black buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![Rgb::ZERO; width * height] }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    /// Nearest-neighbour lookup as if this buffer were stretched over a
    /// `width × height` target. Identity when the sizes agree.
    #[inline]
    pub fn sample(&self, x: usize, y: usize, width: usize, height: usize) -> Rgb {
        if width == self.width && height == self.height {
            return self.get(x, y);
        }
        let sx = (x * self.width / width).min(self.width - 1);
        let sy = (y * self.height / height).min(self.height - 1);
        self.get(sx, sy)
    }
}

/// Tone-mapped composite: display-encoded values clamped to [0,1], bottom-up rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgb>,
}

impl DisplayBuffer {
    /// Pack into the window's `0x00RRGGBB` format, flipping to top-down rows.
    pub fn pack_into(&self, frame: &mut FrameBuffer) {
        frame.width = self.width;
        frame.height = self.height;
        frame.pixels.resize(self.width * self.height, 0);

        for (y, row) in self.pixels.chunks_exact(self.width).enumerate() {
            let out_row = self.height - 1 - y;
            let out = &mut frame.pixels[out_row * self.width..(out_row + 1) * self.width];
            for (dst, px) in out.iter_mut().zip(row) {
                let [r, g, b] = to_u8(*px);
                *dst = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
            }
        }
    }

    /// Top-down 8-bit RGB rows, ready for an encoder.
    pub fn to_rgb8_top_down(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 3);
        for row in self.pixels.chunks_exact(self.width).rev() {
            for px in row {
                out.extend_from_slice(&to_u8(*px));
            }
        }
        out
    }
}

/// Quantize a display value to 8 bits; anything past full scale saturates.
#[inline]
pub fn to_u8(px: Rgb) -> [u8; 3] {
    let q = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    [q(px.r), q(px.g), q(px.b)]
}

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is (pixels)
    pub height: usize,     // how tall the frame is (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb, top-down rows
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}
