//! heicflow API
//!
//! HTTP receiver for storage finalize events: each request runs one pipeline
//! invocation under a wall-clock budget and answers with the outcome.

pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
