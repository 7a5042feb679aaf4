// The compositing primitive every rendering goes through.
// A pass reads one accumulation buffer plus one light vector and writes the
// other accumulation buffer; nothing is ever blended in place. Like a GPU
// context, problems found during a pass are latched and only surface when
// the caller probes for them afterwards.

use crate::error::{Error, Result};
use crate::types::{LightBuffer, Rgb};

/// Shared compositing state, created once at startup and passed by reference.
#[derive(Debug, Default)]
pub struct RenderingContext {
    passes: u64,
    latched: Option<String>,
}

impl RenderingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total compositing passes issued since creation.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// `dst = src + scale * vector`, with `vector` stretched over `dst`.
    pub fn composite(
        &mut self,
        src: &LightBuffer,
        vector: &LightBuffer,
        scale: Rgb,
        dst: &mut LightBuffer,
    ) {
        self.passes += 1;

        if src.dimensions() != dst.dimensions() {
            self.latch(format!(
                "pass {}: source {:?} and target {:?} differ in size",
                self.passes,
                src.dimensions(),
                dst.dimensions()
            ));
            return;
        }
        if !scale.is_finite() {
            self.latch(format!("pass {}: non-finite intensity {scale:?}", self.passes));
            return;
        }

        let (w, h) = dst.dimensions();
        if vector.dimensions() == (w, h) {
            for ((out, acc), v) in dst.pixels.iter_mut().zip(&src.pixels).zip(&vector.pixels) {
                *out = *acc + v.scale(scale);
            }
        } else {
            for y in 0..h {
                for x in 0..w {
                    let i = y * w + x;
                    dst.pixels[i] = src.pixels[i] + vector.sample(x, y, w, h).scale(scale);
                }
            }
        }
    }

    /// Overwrite `dst` with `vector` stretched over it.
    pub fn fill(&mut self, vector: &LightBuffer, dst: &mut LightBuffer) {
        let (w, h) = dst.dimensions();
        for y in 0..h {
            for x in 0..w {
                dst.pixels[y * w + x] = vector.sample(x, y, w, h);
            }
        }
    }

    /// Take the first error latched since the last probe.
    pub fn probe(&mut self) -> Result<()> {
        match self.latched.take() {
            Some(msg) => Err(Error::Backend(msg)),
            None => Ok(()),
        }
    }

    fn latch(&mut self, msg: String) {
        // keep the earliest error, like glGetError
        self.latched.get_or_insert(msg);
    }
}
