//! In-memory fakes for pipeline collaborators.
//!
//! Enabled for this crate's tests and, through the `test-helpers` feature,
//! for downstream crates.

use async_trait::async_trait;
use chrono::Utc;
use heicflow_core::{AppError, ConversionUpdate, FileLookup, FileRecord, StorageBackend};
use heicflow_db::FileRecordStore;
use heicflow_processing::{HeifDecoder, TranscodeError};
use heicflow_storage::{Storage, StorageError, StorageResult, UploadOptions};
use image::{Rgb, RgbImage};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// An object held by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

/// Bucket-like storage kept in a map, with call counters and failure switches.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bucket: Option<String>,
    objects: Mutex<HashMap<String, StoredObject>>,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
    fail_downloads: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, data: impl Into<Vec<u8>>, content_type: &str) {
        self.lock().insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
                metadata: BTreeMap::new(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Make every download fail with a retryable backend error.
    pub fn fail_downloads(self) -> Self {
        self.fail_downloads.store(true, Ordering::SeqCst);
        self
    }

    /// Make every upload fail with a retryable backend error.
    pub fn fail_uploads(self) -> Self {
        self.fail_uploads.store(true, Ordering::SeqCst);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn download_to_file(&self, storage_key: &str, destination: &Path) -> StorageResult<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed("injected failure".to_string()));
        }
        let object = self
            .object(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))?;
        tokio::fs::write(destination, &object.data).await?;
        Ok(object.data.len() as u64)
    }

    async fn upload_from_file(
        &self,
        storage_key: &str,
        source: &Path,
        options: UploadOptions,
    ) -> StorageResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }
        let data = tokio::fs::read(source).await?;
        self.lock().insert(
            storage_key.to_string(),
            StoredObject {
                data,
                content_type: options.content_type,
                metadata: options.metadata,
            },
        );
        Ok(format!("memory://{}", storage_key))
    }

    async fn signed_url(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        Ok(format!(
            "https://storage.test/{}/{}?expires_in={}",
            self.bucket.as_deref().unwrap_or("local"),
            storage_key,
            expires_in.as_secs()
        ))
    }

    fn download_url(&self, storage_key: &str, download_token: &str) -> StorageResult<String> {
        Ok(format!(
            "https://storage.test/v0/b/{}/o/{}?alt=media&token={}",
            self.bucket.as_deref().unwrap_or("local"),
            storage_key.replace('/', "%2F"),
            download_token
        ))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.object(storage_key)
            .map(|object| object.data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    fn backend_type(&self) -> StorageBackend {
        if self.bucket.is_some() {
            StorageBackend::Gcs
        } else {
            StorageBackend::Local
        }
    }
}

/// A file record as the upload flow would create it.
pub fn sample_record(file_name: &str) -> FileRecord {
    FileRecord {
        id: Uuid::new_v4(),
        file_name: file_name.to_string(),
        file_url: format!("https://storage.test/uploads/students/abc/{}", file_name),
        file_size: 1024,
        file_type: "image/heic".to_string(),
        student_id: "abc".to_string(),
        converted_file_name: None,
        converted_file_url: None,
        converted_at: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// File record store over a vector, with scripted misses and call counters.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    records: Mutex<Vec<FileRecord>>,
    misses_remaining: AtomicUsize,
    finds: AtomicUsize,
    updates: AtomicUsize,
    fail_finds: AtomicBool,
    fail_updates: AtomicBool,
}

impl MemoryFileStore {
    pub fn with_records(records: Vec<FileRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Answer the first `n` lookups with no match, as if the record were not
    /// written yet.
    pub fn miss_first(self, n: usize) -> Self {
        self.misses_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_finds(self) -> Self {
        self.fail_finds.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_updates(self) -> Self {
        self.fail_updates.store(true, Ordering::SeqCst);
        self
    }

    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn record(&self, id: Uuid) -> Option<FileRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FileRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileRecordStore for MemoryFileStore {
    async fn find(&self, lookup: &FileLookup) -> Result<Option<FileRecord>, AppError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected lookup failure".to_string()));
        }
        let scripted_miss = self
            .misses_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_miss {
            return Ok(None);
        }

        let records = self.lock();
        let found = match lookup {
            FileLookup::Id(id) => records.iter().find(|r| r.id == *id),
            FileLookup::FileName(name) => records
                .iter()
                .filter(|r| &r.file_name == name)
                .max_by_key(|r| r.created_at),
        };
        Ok(found.cloned())
    }

    async fn attach_conversion(
        &self,
        id: Uuid,
        update: &ConversionUpdate,
    ) -> Result<FileRecord, AppError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected update failure".to_string()));
        }
        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("File record {} not found", id)))?;
        let now = Utc::now();
        record.converted_file_name = Some(update.converted_file_name.clone());
        record.converted_file_url = Some(update.converted_file_url.clone());
        record.converted_at = Some(now);
        record.updated_at = Some(now);
        Ok(record.clone())
    }
}

/// Decoder that ignores its input and yields a fixed gradient, or fails.
#[derive(Debug, Clone, Copy)]
pub struct StaticDecoder {
    width: u32,
    height: u32,
    fail: bool,
}

impl StaticDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail: false,
        }
    }

    /// A decoder that rejects every input as corrupt.
    pub fn failing() -> Self {
        Self {
            width: 0,
            height: 0,
            fail: true,
        }
    }
}

impl HeifDecoder for StaticDecoder {
    fn decode(&self, _data: &[u8]) -> Result<RgbImage, TranscodeError> {
        if self.fail {
            return Err(TranscodeError::Decode("corrupt HEIF container".to_string()));
        }
        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 96])
        }))
    }
}
