// One error type for the whole program.
// Every variant states *where* things went wrong; only `main` decides
// whether a given error ends the session or just gets logged.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A painting needs at least one photograph.
    #[error("no images given")]
    NoImages,

    /// Every photograph must match the size of the first one.
    #[error("image {name} is {}x{}, expected {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    SizeMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Opening or decoding a source photograph failed.
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// Encoding or writing the saved composite failed.
    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A response curve table is unusable (too short, out of range, not monotonic).
    #[error("invalid response curve: {0}")]
    InvalidCurve(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The compositing backend reported an inconsistent state after a pass.
    #[error("compositing backend error: {0}")]
    Backend(String),

    /// The intensity controller could not start or update.
    #[error("controller error: {0}")]
    Controller(String),

    /// Arguments that parse but don't make sense together.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("window init error: {0}")]
    WindowInit(String),

    #[error("window update error: {0}")]
    WindowUpdate(String),
}

impl Error {
    /// Save/encode problems are logged and the render loop keeps going;
    /// everything else ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Encode { .. })
    }

    /// Backend errors leave the accumulation buffers in an unknown state,
    /// so the process aborts instead of unwinding.
    pub fn requires_abort(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}
