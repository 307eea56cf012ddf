//! heicflow storage library
//!
//! This crate provides the storage abstraction the conversion pipeline reads
//! source objects from and publishes converted objects to, with
//! implementations for bucket stores (GCS, S3) and the local filesystem.
//!
//! # Storage key format
//!
//! Keys are object paths relative to the bucket root, exactly as they appear
//! in storage finalize events (e.g. `students/{student_id}/files/{name}`).
//! Keys must not be empty, start with `/`, or contain `..` segments; the
//! `keys` module validates them for every backend.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-object")]
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use heicflow_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::{LocalStorage, ObjectAttributes};
#[cfg(feature = "storage-object")]
pub use object::ObjectStorage;
pub use traits::{Storage, StorageError, StorageResult, UploadOptions};
