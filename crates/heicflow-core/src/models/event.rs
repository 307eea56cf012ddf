//! Storage finalize event model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::constants::METADATA_FILE_ID;

/// Notification that an object write to the bucket is durably complete.
///
/// Field names follow the storage object resource delivered by the provider
/// (`name`, `bucket`, `contentType`, `metadata`); the camelCase spellings
/// `objectPath` and `bucketName` are accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    #[serde(default, alias = "name")]
    pub object_path: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, alias = "bucket")]
    pub bucket_name: String,
    /// Custom object metadata set by the uploader.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl StorageEvent {
    pub fn new(
        object_path: impl Into<String>,
        content_type: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            object_path: Some(object_path.into()),
            content_type: Some(content_type.into()),
            bucket_name: bucket_name.into(),
            metadata: None,
        }
    }

    /// Attach a custom metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Identifier of the originating file record, when the uploader tagged the
    /// object with a `fileId` metadata entry holding a valid UUID.
    pub fn origin_record_id(&self) -> Option<Uuid> {
        self.metadata
            .as_ref()?
            .get(METADATA_FILE_ID)
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_object_resource_shape() {
        let event: StorageEvent = serde_json::from_value(serde_json::json!({
            "name": "students/abc/foo.heic",
            "bucket": "interviews.appspot.com",
            "contentType": "image/heic",
            "size": "2048",
            "metadata": { "firebaseStorageDownloadTokens": "t" }
        }))
        .unwrap();

        assert_eq!(event.object_path.as_deref(), Some("students/abc/foo.heic"));
        assert_eq!(event.bucket_name, "interviews.appspot.com");
        assert_eq!(event.content_type.as_deref(), Some("image/heic"));
        assert_eq!(event.origin_record_id(), None);
    }

    #[test]
    fn test_deserialize_camel_case_shape_with_missing_fields() {
        let event: StorageEvent =
            serde_json::from_value(serde_json::json!({ "objectPath": "a.heic" })).unwrap();
        assert_eq!(event.object_path.as_deref(), Some("a.heic"));
        assert!(event.content_type.is_none());
        assert_eq!(event.bucket_name, "");
        assert!(event.metadata.is_none());
    }

    #[test]
    fn test_origin_record_id() {
        let id = Uuid::new_v4();
        let event = StorageEvent::new("a.heic", "image/heic", "b").with_metadata("fileId", id.to_string());
        assert_eq!(event.origin_record_id(), Some(id));

        let event = StorageEvent::new("a.heic", "image/heic", "b").with_metadata("fileId", "not-a-uuid");
        assert_eq!(event.origin_record_id(), None);
    }
}
