use crate::{HeifDecoder, JpegEncoder, TranscodeError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Summary of one transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeReport {
    pub width: u32,
    pub height: u32,
    pub source_bytes: u64,
    pub output_bytes: u64,
}

/// File-to-file image conversion
#[async_trait]
pub trait ImageTranscoder: Send + Sync {
    /// Read `source`, convert it, and write the result to `destination`.
    async fn transcode_file(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<TranscodeReport, TranscodeError>;
}

/// HEIC/HEIF to JPEG transcoder: decode once, then a single mozjpeg pass.
#[derive(Clone)]
pub struct HeicTranscoder {
    decoder: Arc<dyn HeifDecoder>,
    encoder: JpegEncoder,
}

impl HeicTranscoder {
    pub fn new(decoder: Arc<dyn HeifDecoder>, encoder: JpegEncoder) -> Self {
        Self { decoder, encoder }
    }

    /// Transcoder backed by libheif
    #[cfg(feature = "heif")]
    pub fn with_libheif(encoder: JpegEncoder) -> Self {
        Self::new(Arc::new(crate::LibHeifDecoder::new()), encoder)
    }
}

#[async_trait]
impl ImageTranscoder for HeicTranscoder {
    #[tracing::instrument(skip(self), fields(source = %source.display(), destination = %destination.display()))]
    async fn transcode_file(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<TranscodeReport, TranscodeError> {
        let start = Instant::now();
        let data = tokio::fs::read(source).await?;
        let source_bytes = data.len() as u64;

        let decoder = self.decoder.clone();
        let encoder = self.encoder;
        // Decode and encode are CPU-bound; run off the async pool
        let (jpeg, width, height) = tokio::task::spawn_blocking(move || {
            let img = decoder.decode(&data)?;
            let (width, height) = img.dimensions();
            let jpeg = encoder.encode(&img)?;
            Ok::<_, TranscodeError>((jpeg, width, height))
        })
        .await??;

        tokio::fs::write(destination, &jpeg).await?;

        let report = TranscodeReport {
            width,
            height,
            source_bytes,
            output_bytes: jpeg.len() as u64,
        };

        tracing::info!(
            width = report.width,
            height = report.height,
            size_bytes = report.output_bytes,
            source_size_bytes = report.source_bytes,
            quality = encoder.settings().quality,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transcoded HEIC to JPEG"
        );

        Ok(report)
    }
}
