//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether a redelivery of the same event may succeed.
    ///
    /// Missing objects, bad keys and misconfiguration will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            StorageError::NotFound(_) | StorageError::InvalidKey(_) | StorageError::ConfigError(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Attributes written with an uploaded object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Free-form string metadata stored alongside the object.
    pub metadata: BTreeMap<String, String>,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Storage abstraction trait
///
/// All storage backends (GCS, S3, local filesystem) implement this trait. A
/// storage instance is bound to one bucket; keys are object paths inside it.
/// Transfers go through local files so large images never need to be held
/// in memory twice.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Download an object into `destination`, returning the number of bytes written.
    async fn download_to_file(&self, storage_key: &str, destination: &Path) -> StorageResult<u64>;

    /// Upload the contents of `source` to `storage_key`, overwriting any existing object.
    /// Returns the public URL of the object.
    async fn upload_from_file(
        &self,
        storage_key: &str,
        source: &Path,
        options: UploadOptions,
    ) -> StorageResult<String>;

    /// Generate a signed read URL for the object.
    ///
    /// Backends cap `expires_in` at their own maximum lifetime.
    async fn signed_url(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Read URL that does not expire, for an object uploaded with
    /// `download_token` in its download-token metadata.
    ///
    /// Backends without token-checked downloads return the object's plain URL
    /// and ignore the token.
    fn download_url(&self, storage_key: &str, download_token: &str) -> StorageResult<String>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Name of the bucket this instance is bound to, if the backend has buckets.
    fn bucket(&self) -> Option<&str>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
