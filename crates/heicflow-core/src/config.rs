//! Configuration module
//!
//! This module provides the configuration of the conversion service: where the
//! HTTP receiver listens, which storage backend and document store the pipeline
//! talks to, and the pipeline's numeric settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONVERTED_URL_TTL_DAYS, DEFAULT_CORRELATE_MAX_ATTEMPTS,
    DEFAULT_CORRELATE_RETRY_DELAY_MS, DEFAULT_INVOCATION_TIMEOUT_SECS, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_SOURCE_SIZE_MB,
};
use crate::storage_types::{ConvertedUrlMode, StorageBackend};

// Common constants
const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Settings of the process hosting the pipeline.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Wall-clock budget of one invocation.
    pub invocation_timeout_secs: u64,
}

/// Conversion service configuration
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub storage_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Pipeline configuration
    pub scratch_dir: PathBuf,
    pub jpeg_quality: u8,
    pub correlate_max_attempts: u32,
    pub correlate_retry_delay_ms: u64,
    pub converted_url_mode: ConvertedUrlMode,
    /// Lifetime requested for signed converted URLs
    pub converted_url_ttl_days: u64,
    pub max_source_size_mb: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ConverterConfig>);

impl Config {
    fn inner(&self) -> &ConverterConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ConverterConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().base.invocation_timeout_secs)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn storage_bucket(&self) -> Option<&str> {
        self.inner().storage_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn scratch_dir(&self) -> &std::path::Path {
        &self.inner().scratch_dir
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.inner().jpeg_quality
    }

    pub fn correlate_max_attempts(&self) -> u32 {
        self.inner().correlate_max_attempts
    }

    pub fn correlate_retry_delay(&self) -> Duration {
        Duration::from_millis(self.inner().correlate_retry_delay_ms)
    }

    pub fn converted_url_mode(&self) -> ConvertedUrlMode {
        self.inner().converted_url_mode
    }

    pub fn converted_url_ttl(&self) -> Duration {
        Duration::from_secs(
            self.inner()
                .converted_url_ttl_days
                .saturating_mul(SECS_PER_DAY),
        )
    }

    pub fn max_source_size_bytes(&self) -> u64 {
        self.inner().max_source_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

/// Parse `key` with `lookup`, falling back to `default` when unset or invalid.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|s| !s.trim().is_empty())
}

impl ConverterConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match non_empty(&lookup, "STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::Gcs,
        };

        let base = BaseConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(&lookup, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            invocation_timeout_secs: parse_or(
                &lookup,
                "INVOCATION_TIMEOUT_SECS",
                DEFAULT_INVOCATION_TIMEOUT_SECS,
            ),
        };

        let converted_url_mode = match non_empty(&lookup, "CONVERTED_URL_MODE") {
            Some(raw) => raw.parse::<ConvertedUrlMode>()?,
            None => ConvertedUrlMode::default(),
        };

        let config = ConverterConfig {
            base,
            storage_backend,
            storage_bucket: non_empty(&lookup, "STORAGE_BUCKET"),
            s3_region: non_empty(&lookup, "S3_REGION").or_else(|| non_empty(&lookup, "AWS_REGION")),
            s3_endpoint: non_empty(&lookup, "S3_ENDPOINT"),
            local_storage_path: non_empty(&lookup, "LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty(&lookup, "LOCAL_STORAGE_BASE_URL"),
            scratch_dir: non_empty(&lookup, "SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            jpeg_quality: parse_or(&lookup, "JPEG_QUALITY", DEFAULT_JPEG_QUALITY),
            correlate_max_attempts: parse_or(
                &lookup,
                "CORRELATE_MAX_ATTEMPTS",
                DEFAULT_CORRELATE_MAX_ATTEMPTS,
            ),
            correlate_retry_delay_ms: parse_or(
                &lookup,
                "CORRELATE_RETRY_DELAY_MS",
                DEFAULT_CORRELATE_RETRY_DELAY_MS,
            ),
            converted_url_mode,
            converted_url_ttl_days: parse_or(
                &lookup,
                "CONVERTED_URL_TTL_DAYS",
                DEFAULT_CONVERTED_URL_TTL_DAYS,
            ),
            max_source_size_mb: parse_or(&lookup, "MAX_SOURCE_SIZE_MB", DEFAULT_MAX_SOURCE_SIZE_MB),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.base.database_url.starts_with("postgres://")
            || self.base.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(anyhow::anyhow!("JPEG_QUALITY must be between 1 and 100"));
        }

        if self.correlate_max_attempts == 0 {
            return Err(anyhow::anyhow!("CORRELATE_MAX_ATTEMPTS must be at least 1"));
        }

        if self.base.invocation_timeout_secs == 0 {
            return Err(anyhow::anyhow!("INVOCATION_TIMEOUT_SECS must be at least 1"));
        }

        if self.max_source_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(anyhow::anyhow!(
                "MAX_SOURCE_SIZE_MB is too large: {}",
                self.max_source_size_mb
            ));
        }

        if self.converted_url_ttl_days.checked_mul(SECS_PER_DAY).is_none() {
            return Err(anyhow::anyhow!(
                "CONVERTED_URL_TTL_DAYS is too large: {}",
                self.converted_url_ttl_days
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::Gcs => {
                if self.storage_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BUCKET must be set when using GCS storage backend"
                    ));
                }
            }
            StorageBackend::S3 => {
                if self.storage_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
