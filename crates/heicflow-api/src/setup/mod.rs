//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use heicflow_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Initialize telemetry first
    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup storage
    let storage = storage::setup_storage(&config).await?;

    // Wire the conversion pipeline
    let pipeline = pipeline::setup_pipeline(&config, pool, storage);
    let state = Arc::new(AppState::new(pipeline, config.invocation_timeout()));

    // Setup routes
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
