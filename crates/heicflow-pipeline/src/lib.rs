//! Conversion pipeline: turns a storage finalize event for a HEIC/HEIF upload
//! into a progressive JPEG published next to the source, then attaches the
//! converted file to its upload record.
//!
//! Stages run strictly in sequence within one invocation:
//! filter, fetch, transcode, publish, correlate. The per-invocation scratch
//! directory is removed on every exit path.

pub mod correlate;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod scratch;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use correlate::{ConvertedUrl, Correlation, Correlator, RetryPolicy};
pub use error::PipelineError;
pub use filter::{evaluate, ConversionTarget, FilterDecision};
pub use pipeline::{ConversionPipeline, PipelineConfig};
pub use scratch::ScratchSpace;
