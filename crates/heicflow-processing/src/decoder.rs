use crate::TranscodeError;
use image::RgbImage;

/// Decodes HEIC/HEIF container bytes into 8-bit RGB pixels.
///
/// Implementations apply the container's orientation transforms and drop any
/// alpha channel, so the result can be encoded as JPEG as-is. Decoding is
/// CPU-bound; callers run it on the blocking pool.
pub trait HeifDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<RgbImage, TranscodeError>;
}
