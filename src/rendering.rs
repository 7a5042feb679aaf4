// Live compositing state for one painting.
//
// `front` always holds background + Σ curr[i] * vector[i]. An update only
// re-applies the channels whose intensity moved: each one costs a single
// pass that writes `front + (new - old) * vector` into the back buffer,
// after which the two swap roles. Per-frame cost therefore follows the
// number of changed channels, not the channel count.

use tracing::debug;

use crate::backend::RenderingContext;
use crate::error::{Error, Result};
use crate::painting::Painting;
use crate::types::{DisplayBuffer, LightBuffer, Rgb};

pub struct Rendering<'p> {
    painting: &'p Painting,
    curr: Vec<Rgb>,
    buffers: [LightBuffer; 2],
    front: usize, // index into `buffers`
}

impl<'p> Rendering<'p> {
    /// Allocate accumulation buffers at `width × height`, seed the front one
    /// with the background and start with every channel at zero.
    pub fn create(
        ctx: &mut RenderingContext,
        painting: &'p Painting,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgs(format!("cannot render at {width}x{height}")));
        }
        let mut buffers = [LightBuffer::new(width, height), LightBuffer::new(width, height)];
        ctx.fill(&painting.background, &mut buffers[0]);

        let mut rendering = Self {
            painting,
            curr: vec![Rgb::ZERO; painting.channels()],
            buffers,
            front: 0,
        };
        // nothing differs yet, so this issues no passes
        let zero = vec![Rgb::ZERO; painting.channels()];
        rendering.update(ctx, &zero)?;
        ctx.probe()?;
        Ok(rendering)
    }

    /// Bring the accumulation up to `intensity`, returning how many passes ran.
    pub fn update(&mut self, ctx: &mut RenderingContext, intensity: &[Rgb]) -> Result<usize> {
        if intensity.len() != self.curr.len() {
            return Err(Error::Controller(format!(
                "expected {} intensities, got {}",
                self.curr.len(),
                intensity.len()
            )));
        }

        let mut passes = 0;
        for (i, &next) in intensity.iter().enumerate() {
            if next == self.curr[i] {
                continue;
            }
            let diff = next - self.curr[i];

            let [a, b] = &mut self.buffers;
            let (src, dst) = if self.front == 0 { (&*a, b) } else { (&*b, a) };
            ctx.composite(src, &self.painting.vectors[i].buffer, diff, dst);
            ctx.probe()?;

            self.curr[i] = next;
            self.front ^= 1;
            passes += 1;
        }

        if passes > 0 {
            debug!(passes, "accumulation updated");
        }
        Ok(passes)
    }

    /// Apply `f` to the accumulation. Pure read; the buffers are untouched.
    pub fn tonemap(&self) -> DisplayBuffer {
        let front = self.front();
        let curve = &self.painting.curve;
        DisplayBuffer {
            width: front.width,
            height: front.height,
            pixels: front
                .pixels
                .iter()
                .map(|px| px.map(|v| curve.to_display(v).clamp(0.0, 1.0)))
                .collect(),
        }
    }

    /// Current linear accumulation.
    pub fn front(&self) -> &LightBuffer {
        &self.buffers[self.front]
    }

    /// Intensities the accumulation currently reflects.
    pub fn intensities(&self) -> &[Rgb] {
        &self.curr
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.front().dimensions()
    }
}
