use thiserror::Error;

/// Errors raised while turning a HEIC source into a JPEG
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Failed to decode HEIC image: {0}")]
    Decode(String),

    #[error("Failed to encode JPEG: {0}")]
    Encode(String),

    #[error("Decoded image has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcode task failed: {0}")]
    Task(String),
}

impl TranscodeError {
    /// Codec failures repeat on every attempt; I/O and task failures may not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranscodeError::Io(_) | TranscodeError::Task(_))
    }
}

impl From<tokio::task::JoinError> for TranscodeError {
    fn from(err: tokio::task::JoinError) -> Self {
        TranscodeError::Task(err.to_string())
    }
}
