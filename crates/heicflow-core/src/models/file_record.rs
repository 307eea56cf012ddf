//! File record model: the upload metadata document the pipeline correlates with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of the `files` collection, created by the upload flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub file_type: String,
    pub student_id: String,
    pub converted_file_name: Option<String>,
    pub converted_file_url: Option<String>,
    pub converted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// How to find the file record for a converted object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLookup {
    /// Direct reference carried on the object metadata.
    Id(Uuid),
    /// Secondary lookup by the uploaded file name (with its original extension).
    FileName(String),
}

impl fmt::Display for FileLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileLookup::Id(id) => write!(f, "id={}", id),
            FileLookup::FileName(name) => write!(f, "fileName={}", name),
        }
    }
}

/// Fields written onto a file record after a successful conversion.
///
/// `convertedAt` is assigned by the store at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionUpdate {
    pub converted_file_name: String,
    pub converted_file_url: String,
}
