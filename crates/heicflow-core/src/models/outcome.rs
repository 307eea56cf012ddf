//! Invocation outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an event was not converted. Skips are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingPathOrContentType,
    NotHeic,
    AlreadyConverted,
    ForeignBucket,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingPathOrContentType => "no file path or content type",
            SkipReason::NotHeic => "not a HEIC/HEIF file",
            SkipReason::AlreadyConverted => "already converted file",
            SkipReason::ForeignBucket => "event bucket differs from the configured bucket",
        };
        f.write_str(text)
    }
}

/// Stages whose failure fails the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Transcode,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Transcode => write!(f, "transcode"),
            Stage::Publish => write!(f, "publish"),
        }
    }
}

/// Result of one pipeline invocation, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Skipped {
        reason: SkipReason,
    },
    Converted {
        original_path: String,
        converted_path: String,
        /// Whether the file record was found and updated.
        correlated: bool,
    },
    Failed {
        stage: Stage,
        cause: String,
    },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ConversionOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let outcome = ConversionOutcome::Converted {
            original_path: "a/b.heic".to_string(),
            converted_path: "a/b_converted.jpg".to_string(),
            correlated: false,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "converted");
        assert_eq!(json["converted_path"], "a/b_converted.jpg");

        let skipped = ConversionOutcome::Skipped {
            reason: SkipReason::NotHeic,
        };
        assert_eq!(serde_json::to_value(&skipped).unwrap()["reason"], "not_heic");
        assert!(skipped.is_success());

        let failed = ConversionOutcome::Failed {
            stage: Stage::Transcode,
            cause: "bad".to_string(),
        };
        assert!(!failed.is_success());
    }
}
