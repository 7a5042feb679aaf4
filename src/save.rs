// Full-resolution saves run on their own thread so the render loop never
// waits on the encoder. Each task gets a private copy of the tone-mapped
// pixels; the accumulation buffers keep changing underneath it.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use image::RgbImage;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::DisplayBuffer;

/// Encode `display` as 8-bit RGB with top-down rows; format follows the extension.
pub fn encode_to_file(path: &Path, display: &DisplayBuffer) -> Result<()> {
    let bytes = display.to_rgb8_top_down();
    let img = RgbImage::from_raw(display.width as u32, display.height as u32, bytes)
        .ok_or_else(|| Error::Encode {
            path: path.to_path_buf(),
            source: image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            )),
        })?;
    img.save(path)
        .map_err(|source| Error::Encode { path: path.to_path_buf(), source })
}

pub struct SaveQueue {
    path: PathBuf,
    pending: Vec<JoinHandle<Result<()>>>,
}

impl SaveQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), pending: Vec::new() }
    }

    /// Start saving a copy of `display`. Skipped (returns false) while an
    /// earlier save is still running, so at most one encode is in flight.
    pub fn trigger(&mut self, display: &DisplayBuffer) -> bool {
        self.reap();
        if !self.pending.is_empty() {
            warn!(path = %self.path.display(), "previous save still running, skipping");
            return false;
        }

        let snapshot = display.clone();
        let path = self.path.clone();
        info!(path = %path.display(), width = snapshot.width, height = snapshot.height, "saving");
        self.pending.push(thread::spawn(move || {
            let result = encode_to_file(&path, &snapshot);
            if result.is_ok() {
                info!(path = %path.display(), "saved");
            }
            result
        }));
        true
    }

    /// Number of saves not yet collected.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Collect finished saves and log their failures.
    pub fn reap(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|h| h.is_finished());
        self.pending = running;
        for handle in done {
            report(handle);
        }
    }

    /// Block until every save has finished.
    pub fn join_all(&mut self) {
        for handle in self.pending.drain(..) {
            report(handle);
        }
    }
}

fn report(handle: JoinHandle<Result<()>>) {
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "save failed"),
        Err(_) => warn!("save task panicked"),
    }
}
