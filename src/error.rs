use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("hand landmark model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid landmark frame: {0}")]
    InvalidFrame(String),
    #[error("landmark source thread panicked")]
    SourcePanicked,
    #[error("tracker channel closed")]
    ChannelClosed,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
