//! Event filter: decides whether an event warrants conversion, before any I/O.

use heicflow_core::naming;
use heicflow_core::{SkipReason, StorageEvent};
use uuid::Uuid;

/// Everything the later stages need to know about an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTarget {
    /// Source object path, e.g. `students/abc/foo.heic`
    pub object_path: String,
    pub bucket: String,
    /// Source base name with its original extension, e.g. `foo.heic`
    pub file_name: String,
    /// e.g. `students/abc/foo_converted.jpg`
    pub converted_path: String,
    /// e.g. `foo_converted.jpg`
    pub converted_file_name: String,
    /// File record named by the object's `fileId` metadata, if any
    pub record_id: Option<Uuid>,
}

impl ConversionTarget {
    fn new(object_path: &str, bucket: &str, record_id: Option<Uuid>) -> Self {
        Self {
            object_path: object_path.to_string(),
            bucket: bucket.to_string(),
            file_name: naming::base_name(object_path).to_string(),
            converted_path: naming::converted_object_path(object_path),
            converted_file_name: naming::converted_file_name(object_path),
            record_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Proceed(ConversionTarget),
    Skip(SkipReason),
}

/// Evaluate a finalize event.
///
/// Checks run in order: path and content type present, HEIC/HEIF extension,
/// not pipeline output, and (when the storage is bound to a bucket) the event
/// names that bucket. Any path containing `_converted` is rejected, so the
/// pipeline never consumes its own output.
pub fn evaluate(event: &StorageEvent, expected_bucket: Option<&str>) -> FilterDecision {
    let object_path = match (event.object_path.as_deref(), event.content_type.as_deref()) {
        (Some(path), Some(content_type)) if !path.is_empty() && !content_type.is_empty() => path,
        _ => return FilterDecision::Skip(SkipReason::MissingPathOrContentType),
    };

    if !naming::has_heic_extension(object_path) {
        return FilterDecision::Skip(SkipReason::NotHeic);
    }

    if naming::is_converted(object_path) {
        return FilterDecision::Skip(SkipReason::AlreadyConverted);
    }

    let bucket = match expected_bucket {
        Some(expected) if !event.bucket_name.is_empty() && event.bucket_name != expected => {
            return FilterDecision::Skip(SkipReason::ForeignBucket);
        }
        Some(expected) => expected,
        None => event.bucket_name.as_str(),
    };

    FilterDecision::Proceed(ConversionTarget::new(
        object_path,
        bucket,
        event.origin_record_id(),
    ))
}
