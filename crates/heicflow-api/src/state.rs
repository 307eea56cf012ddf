//! Application state shared by handlers.

use heicflow_pipeline::ConversionPipeline;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: ConversionPipeline,
    /// Wall-clock budget of one invocation
    pub invocation_timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: ConversionPipeline, invocation_timeout: Duration) -> Self {
        Self {
            pipeline,
            invocation_timeout,
        }
    }
}
