//! Shared storage key validation.
//!
//! Keys are object paths relative to the bucket root, e.g. `students/{id}/files/{name}`.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that are empty, absolute, or contain `..` segments.
///
/// All backends validate keys the same way before touching the store.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.starts_with('/') || storage_key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
