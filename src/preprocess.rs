// Turns a decoded photograph into a light vector: linear radiance with the
// background's contribution removed, so each vector holds only what its own
// light source adds to the scene.

use image::Rgb32FImage;

use crate::curve::ResponseCurve;
use crate::error::{Error, Result};
use crate::types::{LightBuffer, Rgb};

/// One source's isolated linear-radiance contribution.
#[derive(Debug, Clone)]
pub struct LightVector {
    pub name: String, // originating file
    pub buffer: LightBuffer,
}

/// Linearize `raw` through `finverse` and subtract `reference` (clamped at zero).
///
/// `reference = None` linearizes against black; that is how the background
/// itself is built. The photograph must be exactly `expected` in size.
/// Rows are flipped to the bottom-up order used by every linear buffer.
pub fn linearize(
    name: &str,
    raw: &Rgb32FImage,
    reference: Option<&LightBuffer>,
    curve: &ResponseCurve,
    expected: (usize, usize),
) -> Result<LightVector> {
    let found = (raw.width() as usize, raw.height() as usize);
    if found != expected {
        return Err(Error::SizeMismatch { name: name.to_string(), expected, found });
    }
    if let Some(reference) = reference {
        if reference.dimensions() != expected {
            return Err(Error::SizeMismatch {
                name: name.to_string(),
                expected,
                found: reference.dimensions(),
            });
        }
    }

    let (width, height) = expected;
    let mut buffer = LightBuffer::new(width, height);

    for (y, row) in raw.rows().enumerate() {
        let out_y = height - 1 - y;
        for (x, px) in row.enumerate() {
            let [r, g, b] = px.0;
            let linear = Rgb::new(r, g, b).map(|v| curve.to_linear(v));
            let base = reference.map_or(Rgb::ZERO, |bg| bg.get(x, out_y));
            // no negative light
            buffer.pixels[out_y * width + x] = (linear - base).map(|v| v.max(0.0));
        }
    }

    Ok(LightVector { name: name.to_string(), buffer })
}
