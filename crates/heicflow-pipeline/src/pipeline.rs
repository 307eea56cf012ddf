use crate::correlate::{ConvertedUrl, Correlator, RetryPolicy};
use crate::error::PipelineError;
use crate::filter::{self, ConversionTarget, FilterDecision};
use crate::scratch::ScratchSpace;
use chrono::{SecondsFormat, Utc};
use heicflow_core::constants::{
    DEFAULT_MAX_SOURCE_SIZE_MB, JPEG_CONTENT_TYPE, METADATA_CONVERTED_AT,
    METADATA_DOWNLOAD_TOKENS, METADATA_ORIGINAL_FILE,
};
use heicflow_core::{Config, ConversionOutcome, ConvertedUrlMode, StorageEvent};
use heicflow_db::FileRecordStore;
use heicflow_processing::ImageTranscoder;
use heicflow_storage::{Storage, UploadOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Tunables for a [`ConversionPipeline`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent of the per-invocation scratch directories
    pub scratch_root: PathBuf,
    pub max_source_size_bytes: u64,
    pub retry: RetryPolicy,
    /// Kind of converted file URL stored on the record
    pub converted_url: ConvertedUrl,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            max_source_size_bytes: DEFAULT_MAX_SOURCE_SIZE_MB * 1024 * 1024,
            retry: RetryPolicy::default(),
            converted_url: ConvertedUrl::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scratch_root: config.scratch_dir().to_path_buf(),
            max_source_size_bytes: config.max_source_size_bytes(),
            retry: RetryPolicy {
                max_attempts: config.correlate_max_attempts(),
                delay: config.correlate_retry_delay(),
            },
            converted_url: match config.converted_url_mode() {
                ConvertedUrlMode::Download => ConvertedUrl::Download,
                ConvertedUrlMode::Signed => ConvertedUrl::Signed {
                    ttl: config.converted_url_ttl(),
                },
            },
        }
    }
}

/// HEIC to JPEG conversion for one storage finalize event at a time.
///
/// Collaborators are injected so tests can substitute in-memory fakes.
/// Invocations share no state beyond the storage bucket and file store and
/// may run concurrently.
#[derive(Clone)]
pub struct ConversionPipeline {
    storage: Arc<dyn Storage>,
    transcoder: Arc<dyn ImageTranscoder>,
    correlator: Correlator,
    config: PipelineConfig,
}

impl ConversionPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        records: Arc<dyn FileRecordStore>,
        transcoder: Arc<dyn ImageTranscoder>,
        config: PipelineConfig,
    ) -> Self {
        let correlator = Correlator::new(
            records,
            storage.clone(),
            config.retry,
            config.converted_url,
        );
        Self {
            storage,
            transcoder,
            correlator,
            config,
        }
    }

    /// Handle one finalize event.
    ///
    /// Skips are `Ok`. Fetch, transcode and publish failures are logged here
    /// once and returned so the caller's runtime can redeliver the event.
    /// Correlation never fails the invocation. Scratch files are removed on
    /// every path.
    #[tracing::instrument(
        skip(self, event),
        fields(
            object_path = event.object_path.as_deref().unwrap_or(""),
            bucket = %event.bucket_name
        )
    )]
    pub async fn handle(&self, event: &StorageEvent) -> Result<ConversionOutcome, PipelineError> {
        let target = match filter::evaluate(event, self.storage.bucket()) {
            FilterDecision::Proceed(target) => target,
            FilterDecision::Skip(reason) => {
                tracing::info!(
                    reason = %reason,
                    content_type = event.content_type.as_deref().unwrap_or(""),
                    "Skipping event"
                );
                return Ok(ConversionOutcome::Skipped { reason });
            }
        };

        let start = Instant::now();
        let scratch = ScratchSpace::create(
            &self.config.scratch_root,
            &target.file_name,
            &target.converted_file_name,
        )
        .map_err(|e| {
            let err = PipelineError::Scratch(e);
            tracing::error!(error = %err, stage = %err.stage(), "Conversion failed");
            err
        })?;

        let result = self.convert(&target, &scratch).await;
        scratch.cleanup();

        match result {
            Ok(correlated) => {
                tracing::info!(
                    converted_path = %target.converted_path,
                    correlated,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Conversion complete"
                );
                Ok(ConversionOutcome::Converted {
                    original_path: target.object_path,
                    converted_path: target.converted_path,
                    correlated,
                })
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    stage = %e.stage(),
                    retryable = e.is_retryable(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Conversion failed"
                );
                Err(e)
            }
        }
    }

    /// Like [`handle`](Self::handle), with failures folded into the outcome.
    pub async fn run(&self, event: &StorageEvent) -> ConversionOutcome {
        match self.handle(event).await {
            Ok(outcome) => outcome,
            Err(e) => e.to_outcome(),
        }
    }

    /// Fetch, transcode, publish, correlate. Returns whether the file record
    /// was updated.
    async fn convert(
        &self,
        target: &ConversionTarget,
        scratch: &ScratchSpace,
    ) -> Result<bool, PipelineError> {
        self.fetch(target, scratch).await?;

        self.transcoder
            .transcode_file(scratch.original_path(), scratch.converted_path())
            .await
            .map_err(|source| PipelineError::Transcode {
                path: target.object_path.clone(),
                source,
            })?;

        let download_token = self.publish(target, scratch).await?;

        let correlation = self.correlator.correlate(target, &download_token).await;
        Ok(correlation.is_attached())
    }

    async fn fetch(
        &self,
        target: &ConversionTarget,
        scratch: &ScratchSpace,
    ) -> Result<(), PipelineError> {
        let fetch_error = |source| PipelineError::Fetch {
            path: target.object_path.clone(),
            source,
        };

        let size_bytes = self
            .storage
            .content_length(&target.object_path)
            .await
            .map_err(fetch_error)?;
        if size_bytes > self.config.max_source_size_bytes {
            return Err(PipelineError::SourceTooLarge {
                path: target.object_path.clone(),
                size_bytes,
                limit_bytes: self.config.max_source_size_bytes,
            });
        }

        let written = self
            .storage
            .download_to_file(&target.object_path, scratch.original_path())
            .await
            .map_err(fetch_error)?;

        tracing::debug!(
            size_bytes = written,
            scratch = %scratch.original_path().display(),
            "Fetched source object"
        );
        Ok(())
    }

    /// Upload the JPEG and return the download token it was published with.
    async fn publish(
        &self,
        target: &ConversionTarget,
        scratch: &ScratchSpace,
    ) -> Result<String, PipelineError> {
        let converted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let download_token = Uuid::new_v4().to_string();
        let options = UploadOptions::new(JPEG_CONTENT_TYPE)
            .with_metadata(METADATA_ORIGINAL_FILE, target.object_path.as_str())
            .with_metadata(METADATA_CONVERTED_AT, converted_at)
            .with_metadata(METADATA_DOWNLOAD_TOKENS, download_token.as_str());

        self.storage
            .upload_from_file(&target.converted_path, scratch.converted_path(), options)
            .await
            .map_err(|source| PipelineError::Publish {
                path: target.converted_path.clone(),
                source,
            })?;

        tracing::debug!(converted_path = %target.converted_path, "Published converted object");
        Ok(download_token)
    }
}
