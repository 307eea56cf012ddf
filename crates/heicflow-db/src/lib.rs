//! heicflow database library
//!
//! Data access for the `files` collection: the upload metadata records the
//! converter correlates published JPEGs with.

pub mod db;

pub use db::{FileRecordRepository, FileRecordStore};
