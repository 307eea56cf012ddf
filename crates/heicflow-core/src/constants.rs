//! Constants shared across the conversion pipeline.

/// Marker embedded in every converted object name. Paths containing it are never converted.
pub const CONVERTED_MARKER: &str = "_converted";

/// Extension of converted objects.
pub const CONVERTED_EXTENSION: &str = "jpg";

/// Content type set on converted objects.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Source extensions accepted by the event filter (compared case-insensitively).
pub const HEIC_EXTENSIONS: [&str; 2] = ["heic", "heif"];

/// Object metadata key holding the source object path.
pub const METADATA_ORIGINAL_FILE: &str = "originalFile";

/// Object metadata key holding the conversion timestamp (RFC 3339).
pub const METADATA_CONVERTED_AT: &str = "convertedAt";

/// Object metadata key holding the download token of a converted object.
///
/// The name is the one Firebase and GCS download URLs check `token=` against.
pub const METADATA_DOWNLOAD_TOKENS: &str = "firebaseStorageDownloadTokens";

/// Object metadata key an uploader may set to name the originating file record.
pub const METADATA_FILE_ID: &str = "fileId";

/// Document store collection holding uploaded file records.
pub const FILES_COLLECTION: &str = "files";

/// Default JPEG quality (0-100 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default number of correlation attempts.
pub const DEFAULT_CORRELATE_MAX_ATTEMPTS: u32 = 3;

/// Default delay between correlation attempts, in milliseconds.
pub const DEFAULT_CORRELATE_RETRY_DELAY_MS: u64 = 2_000;

/// Default requested lifetime of converted-file URLs (roughly one hundred years).
pub const DEFAULT_CONVERTED_URL_TTL_DAYS: u64 = 36_500;

/// Default wall-clock budget of one invocation.
pub const DEFAULT_INVOCATION_TIMEOUT_SECS: u64 = 120;

/// Default maximum source object size.
pub const DEFAULT_MAX_SOURCE_SIZE_MB: u64 = 50;
