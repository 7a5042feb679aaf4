// A painting is one compositing session's immutable input: the background,
// the per-source light vectors and the response curve they were built with.
// Nothing here changes after load; renderings only ever read it.

use std::path::Path;

use image::Rgb32FImage;
use tracing::{debug, info};

use crate::curve::ResponseCurve;
use crate::error::{Error, Result};
use crate::preprocess::{LightVector, linearize};
use crate::types::LightBuffer;

pub struct Painting {
    /// Base illumination added once; all black when background removal is off.
    pub background: LightBuffer,
    /// One vector per controllable channel, in input order.
    pub vectors: Vec<LightVector>,
    pub curve: ResponseCurve,
}

impl Painting {
    /// Decode every path and build the painting.
    ///
    /// With `remove_background` the first photograph becomes the background
    /// and every later one is linearized against it; otherwise there is no
    /// background and every photograph becomes a channel. Each photograph is
    /// linearized as soon as it is decoded, so only one decode is alive at a
    /// time.
    pub fn load<P: AsRef<Path>>(
        paths: &[P],
        remove_background: bool,
        curve: ResponseCurve,
    ) -> Result<Self> {
        let mut builder = Builder::new(remove_background, curve);
        for path in paths {
            let path = path.as_ref();
            let name = path.display().to_string();
            let raw = {
                let decoded = image::open(path)
                    .map_err(|source| Error::Decode { name: name.clone(), source })?;
                // Fail on the first disagreement before converting to float.
                let found = (decoded.width() as usize, decoded.height() as usize);
                builder.check(&name, found)?;
                debug!(%name, width = found.0, height = found.1, "decoded");
                decoded.to_rgb32f()
            };
            builder.push(&name, &raw)?;
        }
        builder.finish()
    }

    /// Build from already-decoded photographs; the first defines the size.
    pub fn from_images(
        images: Vec<(String, Rgb32FImage)>,
        remove_background: bool,
        curve: ResponseCurve,
    ) -> Result<Self> {
        let mut builder = Builder::new(remove_background, curve);
        for (name, raw) in images {
            builder.push(&name, &raw)?;
        }
        builder.finish()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.background.dimensions()
    }

    /// Number of controllable channels.
    pub fn channels(&self) -> usize {
        self.vectors.len()
    }
}

/// Linearizes photographs one at a time, in input order.
struct Builder {
    remove_background: bool,
    curve: ResponseCurve,
    size: Option<(usize, usize)>,
    background: Option<LightBuffer>,
    vectors: Vec<LightVector>,
}

impl Builder {
    fn new(remove_background: bool, curve: ResponseCurve) -> Self {
        Self { remove_background, curve, size: None, background: None, vectors: Vec::new() }
    }

    /// The first size seen becomes canonical; anything else is rejected.
    fn check(&mut self, name: &str, found: (usize, usize)) -> Result<(usize, usize)> {
        let expected = *self.size.get_or_insert(found);
        if found != expected {
            return Err(Error::SizeMismatch { name: name.to_string(), expected, found });
        }
        Ok(expected)
    }

    fn push(&mut self, name: &str, raw: &Rgb32FImage) -> Result<()> {
        let size = self.check(name, (raw.width() as usize, raw.height() as usize))?;
        if self.remove_background && self.background.is_none() {
            let bg = linearize(name, raw, None, &self.curve, size)?;
            self.background = Some(bg.buffer);
        } else {
            let v = linearize(name, raw, self.background.as_ref(), &self.curve, size)?;
            self.vectors.push(v);
        }
        Ok(())
    }

    fn finish(self) -> Result<Painting> {
        let (width, height) = self.size.ok_or(Error::NoImages)?;
        let background = self.background.unwrap_or_else(|| LightBuffer::new(width, height));
        info!(
            channels = self.vectors.len(),
            width,
            height,
            remove_background = self.remove_background,
            "painting loaded"
        );
        Ok(Painting { background, vectors: self.vectors, curve: self.curve })
    }
}
