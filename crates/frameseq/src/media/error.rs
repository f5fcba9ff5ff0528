use std::io;

use thiserror::Error;

use super::Mode;

/// Failures raised by a decode session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("GIF decode error: {0}")]
    Gif(#[from] gif::DecodingError),

    #[error("WebP decode error: {0}")]
    Webp(#[from] image_webp::DecodingError),

    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("image is not animated")]
    NotAnimated,

    #[error("decoder produced an empty frame")]
    EmptyFrame,

    #[error("no more frames")]
    NoMoreFrames,

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Why a reader operation failed.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("mode {0:?} is not served by the animated frame reader")]
    UnsupportedMode(Mode),

    #[error("byte source unavailable: {0}")]
    SourceUnavailable(#[from] io::Error),

    #[error("source is not a readable animation: {0}")]
    SessionUnreadable(#[source] SessionError),

    #[error("frames exhausted and restart failed: {0}")]
    DecodeExhausted(#[source] Box<ReaderError>),

    #[error("frame decode failed: {0}")]
    DecodeFailed(#[source] SessionError),
}
