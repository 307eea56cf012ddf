//! HEIC/HEIF decoding through libheif

use crate::{HeifDecoder, TranscodeError};
use image::RgbImage;
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

/// Decoder backed by the native libheif library.
///
/// Decodes the primary image with transformations applied (rotation and
/// mirroring from the container are baked into the pixels) into interleaved
/// 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibHeifDecoder;

impl LibHeifDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl HeifDecoder for LibHeifDecoder {
    fn decode(&self, data: &[u8]) -> Result<RgbImage, TranscodeError> {
        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(data)
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        tracing::debug!(
            width = handle.width(),
            height = handle.height(),
            has_alpha = handle.has_alpha_channel(),
            "Decoding primary HEIF image"
        );

        let decoded = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| TranscodeError::Decode("No interleaved RGB plane".to_string()))?;

        let (width, height) = (plane.width, plane.height);
        if width == 0 || height == 0 {
            return Err(TranscodeError::InvalidDimensions { width, height });
        }

        // Rows may be padded past width * 3
        let row_len = width as usize * 3;
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            let row = row.get(..row_len).ok_or_else(|| {
                TranscodeError::Decode(format!(
                    "Plane row shorter than {} bytes (stride {})",
                    row_len, plane.stride
                ))
            })?;
            pixels.extend_from_slice(row);
        }

        RgbImage::from_raw(width, height, pixels)
            .ok_or(TranscodeError::InvalidDimensions { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{scan_mode, ScanMode};
    use crate::{HeicTranscoder, ImageTranscoder, JpegEncoder};
    use image::GenericImageView;
    use libheif_rs::{Channel, CompressionFormat, EncoderQuality, Image};
    use tempfile::tempdir;

    const FILL: [u8; 3] = [200, 40, 90];

    /// Encode a solid-colour HEIC with libheif's HEVC encoder.
    fn heic_bytes(width: u32, height: u32, chroma: RgbChroma) -> Vec<u8> {
        let channels = match chroma {
            RgbChroma::Rgba => 4,
            _ => 3,
        };
        let mut image = Image::new(width, height, ColorSpace::Rgb(chroma)).unwrap();
        image
            .create_plane(Channel::Interleaved, width, height, 8)
            .unwrap();

        let mut plane = image.planes_mut().interleaved.unwrap();
        let row_len = width as usize * channels;
        for row in plane.data.chunks_mut(plane.stride).take(height as usize) {
            for pixel in row[..row_len].chunks_mut(channels) {
                pixel[..3].copy_from_slice(&FILL);
                if channels == 4 {
                    pixel[3] = 128;
                }
            }
        }

        let lib_heif = LibHeif::new();
        let mut ctx = HeifContext::new().unwrap();
        let mut encoder = lib_heif
            .encoder_for_format(CompressionFormat::Hevc)
            .unwrap();
        encoder.set_quality(EncoderQuality::Lossy(90)).unwrap();
        ctx.encode_image(&image, &mut encoder, None).unwrap();
        ctx.write_to_bytes().unwrap()
    }

    fn assert_close_to_fill(pixel: &image::Rgb<u8>) {
        for (got, want) in pixel.0.iter().zip(FILL) {
            assert!(
                got.abs_diff(want) <= 16,
                "pixel {:?} too far from {:?}",
                pixel.0,
                FILL
            );
        }
    }

    #[test]
    fn test_decodes_odd_width_without_stride_padding() {
        let img = LibHeifDecoder::new()
            .decode(&heic_bytes(33, 17, RgbChroma::Rgb))
            .unwrap();

        assert_eq!(img.dimensions(), (33, 17));
        assert_eq!(img.as_raw().len(), 33 * 17 * 3);
        // Last column of every row must be pixel data, not row padding
        for y in 0..17 {
            assert_close_to_fill(img.get_pixel(32, y));
        }
        assert_close_to_fill(img.get_pixel(0, 0));
    }

    #[test]
    fn test_alpha_source_decodes_to_rgb() {
        let img = LibHeifDecoder::new()
            .decode(&heic_bytes(20, 10, RgbChroma::Rgba))
            .unwrap();

        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.as_raw().len(), 20 * 10 * 3);
    }

    #[tokio::test]
    async fn test_libheif_transcoder_writes_progressive_jpeg() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("IMG_0001.heic");
        let destination = dir.path().join("IMG_0001_converted.jpg");
        std::fs::write(&source, heic_bytes(33, 17, RgbChroma::Rgb)).unwrap();

        let report = HeicTranscoder::with_libheif(JpegEncoder::default())
            .transcode_file(&source, &destination)
            .await
            .unwrap();
        assert_eq!((report.width, report.height), (33, 17));

        let jpeg = std::fs::read(&destination).unwrap();
        assert_eq!(scan_mode(&jpeg), Some(ScanMode::Progressive));
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (33, 17));
        let rgb = decoded.to_rgb8();
        assert_close_to_fill(rgb.get_pixel(16, 8));
    }

    #[test]
    fn test_rejects_non_heif_bytes() {
        let result = LibHeifDecoder::new().decode(b"definitely not a heif container");
        assert!(matches!(result, Err(TranscodeError::Decode(_))));
    }

    #[test]
    fn test_rejects_empty_input() {
        let result = LibHeifDecoder::new().decode(&[]);
        assert!(result.is_err());
    }
}
