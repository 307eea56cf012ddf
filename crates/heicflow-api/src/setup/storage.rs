//! Storage setup and initialization

use anyhow::{Context, Result};
use heicflow_core::Config;
use heicflow_storage::{create_storage, Storage};
use std::sync::Arc;

/// Setup the storage backend the pipeline reads from and publishes to
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(
        backend = %storage.backend_type(),
        bucket = storage.bucket().unwrap_or("-"),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}
