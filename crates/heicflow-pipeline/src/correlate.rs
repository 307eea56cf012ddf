//! Correlate: attach the converted file to its upload record.
//!
//! Best effort. The upload flow may write the record after the finalize event
//! fires, so lookups that come back empty are retried a bounded number of
//! times. Nothing in here fails the invocation.

use crate::filter::ConversionTarget;
use heicflow_core::constants::{DEFAULT_CORRELATE_MAX_ATTEMPTS, DEFAULT_CORRELATE_RETRY_DELAY_MS};
use heicflow_core::{ConversionUpdate, FileLookup, FileRecord};
use heicflow_db::FileRecordStore;
use heicflow_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Bounded, fixed-delay retry for record lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CORRELATE_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_CORRELATE_RETRY_DELAY_MS),
        }
    }
}

/// How the converted file URL written onto the record is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConvertedUrl {
    /// Token-checked download URL for the token published with the object.
    /// Does not expire.
    #[default]
    Download,
    /// Provider-signed URL. GCS and S3 cap `ttl` at 7 days.
    Signed { ttl: Duration },
}

/// What correlation achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    Attached { record_id: Uuid },
    /// No record matched within the retry budget
    NotFound { attempts: u32 },
    /// A record matched but could not be updated
    Failed { cause: String },
}

impl Correlation {
    pub fn is_attached(&self) -> bool {
        matches!(self, Correlation::Attached { .. })
    }
}

#[derive(Clone)]
pub struct Correlator {
    records: Arc<dyn FileRecordStore>,
    storage: Arc<dyn Storage>,
    policy: RetryPolicy,
    url: ConvertedUrl,
}

impl Correlator {
    pub fn new(
        records: Arc<dyn FileRecordStore>,
        storage: Arc<dyn Storage>,
        policy: RetryPolicy,
        url: ConvertedUrl,
    ) -> Self {
        Self {
            records,
            storage,
            policy,
            url,
        }
    }

    /// Find the target's record, build the read URL of the converted object
    /// and write both onto the record.
    ///
    /// `download_token` is the token the converted object was published with.
    ///
    /// Records named by the object's `fileId` metadata are looked up by id;
    /// otherwise by the source file name.
    #[tracing::instrument(skip(self, target, download_token), fields(object_path = %target.object_path))]
    pub async fn correlate(&self, target: &ConversionTarget, download_token: &str) -> Correlation {
        let lookup = match target.record_id {
            Some(id) => FileLookup::Id(id),
            None => FileLookup::FileName(target.file_name.clone()),
        };

        let record = match self.find_with_retry(&lookup).await {
            Some(record) => record,
            None => {
                tracing::warn!(
                    lookup = %lookup,
                    attempts = self.policy.max_attempts,
                    "No file record found, converted file left uncorrelated"
                );
                return Correlation::NotFound {
                    attempts: self.policy.max_attempts,
                };
            }
        };

        let url = match self.url {
            ConvertedUrl::Download => self
                .storage
                .download_url(&target.converted_path, download_token),
            ConvertedUrl::Signed { ttl } => {
                self.storage.signed_url(&target.converted_path, ttl).await
            }
        };
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    record_id = %record.id,
                    converted_path = %target.converted_path,
                    "Failed to generate converted file URL"
                );
                return Correlation::Failed {
                    cause: e.to_string(),
                };
            }
        };

        let update = ConversionUpdate {
            converted_file_name: target.converted_file_name.clone(),
            converted_file_url: url,
        };
        match self.records.attach_conversion(record.id, &update).await {
            Ok(updated) => {
                tracing::info!(
                    record_id = %updated.id,
                    converted_file_name = %update.converted_file_name,
                    "File record updated with converted file"
                );
                Correlation::Attached {
                    record_id: updated.id,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, record_id = %record.id, "Failed to update file record");
                Correlation::Failed {
                    cause: e.to_string(),
                }
            }
        }
    }

    async fn find_with_retry(&self, lookup: &FileLookup) -> Option<FileRecord> {
        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.records.find(lookup).await {
                Ok(Some(record)) => {
                    tracing::debug!(attempt, record_id = %record.id, "File record found");
                    return Some(record);
                }
                Ok(None) => {
                    tracing::debug!(attempt, max_attempts, "File record not found yet");
                }
                // Treated like a miss
                Err(e) => {
                    tracing::warn!(error = %e, attempt, max_attempts, "File record lookup failed");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }
        None
    }
}
