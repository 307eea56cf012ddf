use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult, UploadOptions};
use crate::StorageBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Suffix of the sidecar file holding an object's content type and metadata.
const SIDECAR_SUFFIX: &str = ".meta.json";

/// Content type and metadata of a locally stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAttributes {
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

/// Local filesystem storage implementation
///
/// Objects live under `base_path/{key}`; attributes are kept in a JSON
/// sidecar next to each object.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/heicflow/objects")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8080/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        if storage_key.ends_with(SIDECAR_SUFFIX) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key may not end with {}",
                SIDECAR_SUFFIX
            )));
        }
        Ok(self.base_path.join(storage_key))
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Read the attributes written with an object.
    pub async fn attributes(&self, storage_key: &str) -> StorageResult<ObjectAttributes> {
        let path = self.key_to_path(storage_key)?;
        let sidecar = Self::sidecar_path(&path);
        if !fs::try_exists(&sidecar).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        let raw = fs::read(&sidecar).await?;
        serde_json::from_slice(&raw).map_err(|e| {
            StorageError::BackendError(format!(
                "Invalid attributes sidecar {}: {}",
                sidecar.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn download_to_file(&self, storage_key: &str, destination: &Path) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let size = fs::copy(&path, destination).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                destination.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(size)
    }

    async fn upload_from_file(
        &self,
        storage_key: &str,
        source: &Path,
        options: UploadOptions,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;
        let start = std::time::Instant::now();

        let size = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                path.display(),
                e
            ))
        })?;

        let attributes = ObjectAttributes {
            content_type: options.content_type,
            metadata: options.metadata,
        };
        let sidecar = serde_json::to_vec_pretty(&attributes)
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        fs::write(Self::sidecar_path(&path), sidecar)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write attributes for {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            content_type = %attributes.content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn signed_url(&self, storage_key: &str, _expires_in: Duration) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        Ok(self.generate_url(storage_key))
    }

    fn download_url(&self, storage_key: &str, _download_token: &str) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        Ok(self.generate_url(storage_key))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn bucket(&self) -> Option<&str> {
        None
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir.join("objects"), "http://localhost:8080/files".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = dir.path().join("source.heic");
        std::fs::write(&source, b"test data").unwrap();

        let url = storage
            .upload_from_file("students/abc/foo.heic", &source, UploadOptions::new("image/heic"))
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/files/students/abc/foo.heic");

        let destination = dir.path().join("copy.heic");
        let size = storage
            .download_to_file("students/abc/foo.heic", &destination)
            .await
            .unwrap();
        assert_eq!(size, 9);
        assert_eq!(std::fs::read(&destination).unwrap(), b"test data");
    }

    #[tokio::test]
    async fn test_attributes_are_persisted() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = dir.path().join("out.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        storage
            .upload_from_file(
                "students/abc/foo_converted.jpg",
                &source,
                UploadOptions::new("image/jpeg")
                    .with_metadata("originalFile", "students/abc/foo.heic")
                    .with_metadata("convertedAt", "2026-01-01T00:00:00Z"),
            )
            .await
            .unwrap();

        let attributes = storage.attributes("students/abc/foo_converted.jpg").await.unwrap();
        assert_eq!(attributes.content_type, "image/jpeg");
        assert_eq!(
            attributes.metadata.get("originalFile").map(String::as_str),
            Some("students/abc/foo.heic")
        );
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage
            .download_to_file("../../../etc/passwd", &dir.path().join("x"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.content_length("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.download_url("/etc/passwd", "token");
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_missing_object() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage
            .download_to_file("nonexistent/file.heic", &dir.path().join("x"))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(matches!(
            storage.content_length("nonexistent/file.heic").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_urls_are_public_urls() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let url = storage
            .signed_url("a/b_converted.jpg", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/files/a/b_converted.jpg");
        assert_eq!(
            storage.download_url("a/b_converted.jpg", "token").unwrap(),
            "http://localhost:8080/files/a/b_converted.jpg"
        );
        assert_eq!(storage.bucket(), None);
    }
}
