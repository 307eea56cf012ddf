use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because it's used by configuration and by the storage factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Gcs,
    S3,
    Local,
}

impl StorageBackend {
    /// Whether the backend addresses objects inside a named bucket.
    pub fn uses_bucket(self) -> bool {
        matches!(self, StorageBackend::Gcs | StorageBackend::S3)
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcs" | "gcp" => Ok(StorageBackend::Gcs),
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

/// How the converted file URL stored on the file record is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertedUrlMode {
    /// Download-token URL; stays valid until the token is revoked.
    #[default]
    Download,
    /// V4 signed URL. GCS and S3 cap its lifetime at 7 days.
    Signed,
}

impl FromStr for ConvertedUrlMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "download" | "token" => Ok(ConvertedUrlMode::Download),
            "signed" => Ok(ConvertedUrlMode::Signed),
            _ => Err(anyhow::anyhow!("Invalid converted URL mode: {}", s)),
        }
    }
}

impl Display for ConvertedUrlMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConvertedUrlMode::Download => write!(f, "download"),
            ConvertedUrlMode::Signed => write!(f, "signed"),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Gcs => write!(f, "gcs"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("GCS".parse::<StorageBackend>().unwrap(), StorageBackend::Gcs);
        assert_eq!("gcp".parse::<StorageBackend>().unwrap(), StorageBackend::Gcs);
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!("Local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for backend in [StorageBackend::Gcs, StorageBackend::S3, StorageBackend::Local] {
            assert_eq!(backend.to_string().parse::<StorageBackend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_parse_converted_url_mode() {
        assert_eq!(
            "token".parse::<ConvertedUrlMode>().unwrap(),
            ConvertedUrlMode::Download
        );
        assert_eq!(
            "Signed".parse::<ConvertedUrlMode>().unwrap(),
            ConvertedUrlMode::Signed
        );
        assert!("forever".parse::<ConvertedUrlMode>().is_err());
        assert_eq!(ConvertedUrlMode::default(), ConvertedUrlMode::Download);
    }
}
