//! Conversion pipeline wiring

use heicflow_core::Config;
use heicflow_db::FileRecordRepository;
use heicflow_pipeline::{ConversionPipeline, PipelineConfig};
use heicflow_processing::{HeicTranscoder, JpegEncoder, JpegSettings};
use heicflow_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Build the pipeline from its production collaborators
pub fn setup_pipeline(config: &Config, pool: PgPool, storage: Arc<dyn Storage>) -> ConversionPipeline {
    let encoder = JpegEncoder::new(JpegSettings::with_quality(config.jpeg_quality()));
    let transcoder = Arc::new(HeicTranscoder::with_libheif(encoder));
    let records = Arc::new(FileRecordRepository::new(pool));
    let pipeline_config = PipelineConfig::from_config(config);

    tracing::info!(
        jpeg_quality = config.jpeg_quality(),
        scratch_root = %pipeline_config.scratch_root.display(),
        correlate_max_attempts = pipeline_config.retry.max_attempts,
        correlate_retry_delay_ms = pipeline_config.retry.delay.as_millis() as u64,
        max_source_size_bytes = pipeline_config.max_source_size_bytes,
        converted_url = ?pipeline_config.converted_url,
        "Conversion pipeline configured"
    );

    ConversionPipeline::new(storage, records, transcoder, pipeline_config)
}
