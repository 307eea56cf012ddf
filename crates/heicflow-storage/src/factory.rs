#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-object")]
use crate::ObjectStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use heicflow_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-object")]
        StorageBackend::Gcs => {
            let bucket = config
                .storage_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("STORAGE_BUCKET not configured".to_string()))?;

            let storage = ObjectStorage::gcs(bucket)?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-object")]
        StorageBackend::S3 => {
            let bucket = config
                .storage_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("STORAGE_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = ObjectStorage::s3(bucket, region, endpoint)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-object"))]
        StorageBackend::Gcs | StorageBackend::S3 => Err(StorageError::ConfigError(
            "Bucket storage backends not available (storage-object feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
