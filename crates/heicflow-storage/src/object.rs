use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult, UploadOptions};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::Method;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Longest lifetime GCS and S3 accept for a V4 signed URL.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Host serving token-checked downloads of GCS objects.
const GCS_DOWNLOAD_HOST: &str = "https://firebasestorage.googleapis.com";

/// Bucket storage backed by `object_store` (GCS, S3 and S3-compatible providers)
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
    backend: StorageBackend,
    bucket: String,
    public_base_url: String,
}

impl ObjectStorage {
    /// Create a Google Cloud Storage instance.
    ///
    /// Credentials are read from the environment (`GOOGLE_SERVICE_ACCOUNT`,
    /// `GOOGLE_APPLICATION_CREDENTIALS`, or the metadata server).
    pub fn gcs(bucket: String) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        let store = Arc::new(store);

        Ok(ObjectStorage {
            store: store.clone(),
            signer: Some(store),
            backend: StorageBackend::Gcs,
            public_base_url: format!("https://storage.googleapis.com/{}", bucket),
            bucket,
        })
    }

    /// Create an S3 instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        let store = Arc::new(store);

        // Path-style URLs for S3-compatible providers, virtual-hosted style for AWS
        let public_base_url = match endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Ok(ObjectStorage {
            store: store.clone(),
            signer: Some(store),
            backend: StorageBackend::S3,
            bucket,
            public_base_url,
        })
    }

    /// Wrap an arbitrary object store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        signer: Option<Arc<dyn Signer>>,
        backend: StorageBackend,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        ObjectStorage {
            store,
            signer,
            backend,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    fn map_read_error(&self, storage_key: &str, err: ObjectStoreError) -> StorageError {
        match err {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        }
    }
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn download_to_file(&self, storage_key: &str, destination: &Path) -> StorageResult<u64> {
        validate_key(storage_key)?;
        let location = ObjectPath::from(storage_key);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %self.bucket,
                key = %storage_key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object download failed"
            );
            self.map_read_error(storage_key, e)
        })?;

        let mut file = fs::File::create(destination).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to create file {}: {}",
                destination.display(),
                e
            ))
        })?;

        let mut stream = result.into_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await.map_err(|e| {
                StorageError::DownloadFailed(format!(
                    "Failed to write file {}: {}",
                    destination.display(),
                    e
                ))
            })?;
            written += chunk.len() as u64;
        }
        file.sync_all().await?;

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(written)
    }

    async fn upload_from_file(
        &self,
        storage_key: &str,
        source: &Path,
        options: UploadOptions,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let data = fs::read(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read file {}: {}", source.display(), e))
        })?;
        let size = data.len() as u64;
        let location = ObjectPath::from(storage_key);
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(options.content_type.clone()),
        );
        for (key, value) in options.metadata {
            attributes.insert(Attribute::Metadata(key.into()), AttributeValue::from(value));
        }
        let put_options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), put_options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %options.content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn signed_url(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(storage_key)?;
        let signer = self.signer.as_ref().ok_or_else(|| {
            StorageError::ConfigError(format!(
                "{} storage has no URL signer configured",
                self.backend
            ))
        })?;

        let effective = expires_in.min(MAX_SIGNED_URL_TTL);
        if effective < expires_in {
            tracing::debug!(
                key = %storage_key,
                requested_secs = expires_in.as_secs(),
                effective_secs = effective.as_secs(),
                "Signed URL lifetime capped at provider maximum"
            );
        }

        let location = ObjectPath::from(storage_key);
        let url_result: ObjectResult<_> = signer.signed_url(Method::GET, &location, effective).await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn download_url(&self, storage_key: &str, download_token: &str) -> StorageResult<String> {
        validate_key(storage_key)?;
        match self.backend {
            // The object path is a single URL segment, slashes included
            StorageBackend::Gcs => Ok(format!(
                "{}/v0/b/{}/o/{}?alt=media&token={}",
                GCS_DOWNLOAD_HOST,
                self.bucket,
                urlencoding::encode(storage_key),
                urlencoding::encode(download_token)
            )),
            // Readable as long as the bucket policy allows public reads
            StorageBackend::S3 | StorageBackend::Local => Ok(self.generate_url(storage_key)),
        }
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        validate_key(storage_key)?;
        let location = ObjectPath::from(storage_key);
        let meta = self
            .store
            .head(&location)
            .await
            .map_err(|e| self.map_read_error(storage_key, e))?;
        Ok(meta.size as u64)
    }

    fn bucket(&self) -> Option<&str> {
        Some(&self.bucket)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::GetOptions;
    use tempfile::tempdir;

    fn memory_storage() -> (ObjectStorage, Arc<InMemory>) {
        let memory = Arc::new(InMemory::new());
        let storage = ObjectStorage::with_store(
            memory.clone(),
            None,
            StorageBackend::Gcs,
            "interviews",
            "https://storage.googleapis.com/interviews",
        );
        (storage, memory)
    }

    #[tokio::test]
    async fn test_upload_sets_content_type_and_metadata() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("foo_converted.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let (storage, memory) = memory_storage();

        let url = storage
            .upload_from_file(
                "students/abc/foo_converted.jpg",
                &source,
                UploadOptions::new("image/jpeg").with_metadata("originalFile", "students/abc/foo.heic"),
            )
            .await
            .unwrap();
        assert_eq!(
            url,
            "https://storage.googleapis.com/interviews/students/abc/foo_converted.jpg"
        );

        let result = memory
            .get_opts(
                &ObjectPath::from("students/abc/foo_converted.jpg"),
                GetOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType).map(|v| &**v),
            Some("image/jpeg")
        );
        assert_eq!(
            result
                .attributes
                .get(&Attribute::Metadata("originalFile".into()))
                .map(|v| &**v),
            Some("students/abc/foo.heic")
        );
    }

    #[tokio::test]
    async fn test_download_to_file_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("upload.heic");
        std::fs::write(&source, b"heic bytes").unwrap();
        let (storage, _) = memory_storage();

        storage
            .upload_from_file("a/b.heic", &source, UploadOptions::new("image/heic"))
            .await
            .unwrap();

        let destination = dir.path().join("download.heic");
        let written = storage.download_to_file("a/b.heic", &destination).await.unwrap();
        assert_eq!(written, 10);
        assert_eq!(std::fs::read(&destination).unwrap(), b"heic bytes");
        assert_eq!(storage.content_length("a/b.heic").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let (storage, _) = memory_storage();
        let result = storage
            .download_to_file("missing.heic", &dir.path().join("x"))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(matches!(
            storage.content_length("missing.heic").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_signed_url_without_signer_is_config_error() {
        let (storage, _) = memory_storage();
        let result = storage
            .signed_url("a/b_converted.jpg", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[test]
    fn test_gcs_download_url_carries_token_and_no_expiry() {
        let (storage, _) = memory_storage();
        let url = storage
            .download_url(
                "students/abc/IMG 0042_converted.jpg",
                "0b7e6b3c-5f0e-4c55-9a3c-2f0f7c1b9d11",
            )
            .unwrap();

        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/interviews/o/\
             students%2Fabc%2FIMG%200042_converted.jpg\
             ?alt=media&token=0b7e6b3c-5f0e-4c55-9a3c-2f0f7c1b9d11"
        );
        assert!(!url.contains("Expires"));
    }

    #[test]
    fn test_s3_download_url_is_object_url() {
        let storage = ObjectStorage::with_store(
            Arc::new(InMemory::new()),
            None,
            StorageBackend::S3,
            "interviews",
            "https://interviews.s3.eu-west-1.amazonaws.com",
        );
        assert_eq!(
            storage.download_url("a/b_converted.jpg", "token").unwrap(),
            "https://interviews.s3.eu-west-1.amazonaws.com/a/b_converted.jpg"
        );
        assert!(matches!(
            storage.download_url("../b_converted.jpg", "token"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
