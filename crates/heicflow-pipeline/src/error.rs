use heicflow_core::{ConversionOutcome, Stage};
use heicflow_processing::TranscodeError;
use heicflow_storage::StorageError;
use thiserror::Error;

/// Fatal failure of a pipeline invocation.
///
/// Correlation problems never surface here; they degrade to a converted
/// outcome without a record update.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to prepare scratch space: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("Source {path} is {size_bytes} bytes, over the {limit_bytes} byte limit")]
    SourceTooLarge {
        path: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    #[error("Failed to transcode {path}: {source}")]
    Transcode {
        path: String,
        #[source]
        source: TranscodeError,
    },

    #[error("Failed to publish {path}: {source}")]
    Publish {
        path: String,
        #[source]
        source: StorageError,
    },
}

impl PipelineError {
    /// The stage the invocation failed in. Scratch setup counts as fetch.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Scratch(_)
            | PipelineError::Fetch { .. }
            | PipelineError::SourceTooLarge { .. } => Stage::Fetch,
            PipelineError::Transcode { .. } => Stage::Transcode,
            PipelineError::Publish { .. } => Stage::Publish,
        }
    }

    /// Whether redelivering the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Scratch(_) => true,
            PipelineError::Fetch { source, .. } | PipelineError::Publish { source, .. } => {
                source.is_retryable()
            }
            PipelineError::SourceTooLarge { .. } => false,
            PipelineError::Transcode { source, .. } => source.is_retryable(),
        }
    }

    pub fn to_outcome(&self) -> ConversionOutcome {
        ConversionOutcome::Failed {
            stage: self.stage(),
            cause: self.to_string(),
        }
    }
}
