//! Speech Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    #[error("Input text cannot be empty")]
    EmptyText,

    #[error("Speed must be a positive number, got {0}")]
    InvalidSpeed(f32),

    #[error("Unsupported response format: {0} (expected wav, mp3, opus or flac)")]
    UnsupportedFormat(String),
}
