use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A line of a detections replay file could not be used.
    #[error("replay line {line}: {reason}")]
    Replay { line: usize, reason: String },

    #[error("unsupported container {0:?}: expected mp4, mov or avi")]
    UnsupportedContainer(PathBuf),

    #[cfg(feature = "opencv")]
    #[error("video error: {0}")]
    Video(#[from] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("could not open video {0:?}")]
    VideoOpen(PathBuf),
}
