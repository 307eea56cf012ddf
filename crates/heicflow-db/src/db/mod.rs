//! Database repositories for data access layer
//
// File metadata records (lookup + conversion attachment)
pub mod files;

pub use files::{FileRecordRepository, FileRecordStore};
