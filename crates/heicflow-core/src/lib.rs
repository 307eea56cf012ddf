//! heicflow core library
//!
//! This crate provides the domain models, object naming rules, error types and
//! configuration shared by every heicflow component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod naming;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ConverterConfig};
pub use error::AppError;
pub use models::{
    ConversionOutcome, ConversionUpdate, FileLookup, FileRecord, SkipReason, Stage, StorageEvent,
};
pub use storage_types::{ConvertedUrlMode, StorageBackend};
