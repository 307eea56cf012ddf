use crate::TranscodeError;
use heicflow_core::constants::DEFAULT_JPEG_QUALITY;
use image::RgbImage;

/// JPEG compression settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegSettings {
    /// Quality on the 1-100 scale
    pub quality: u8,
    pub progressive: bool,
    /// Optimized Huffman tables
    pub optimize_coding: bool,
}

impl Default for JpegSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            progressive: true,
            optimize_coding: true,
        }
    }
}

impl JpegSettings {
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            ..Self::default()
        }
    }
}

/// JPEG encoder using mozjpeg
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder {
    settings: JpegSettings,
}

impl JpegEncoder {
    pub fn new(settings: JpegSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> JpegSettings {
        self.settings
    }

    /// Compress RGB pixels to a JPEG byte stream
    pub fn encode(&self, img: &RgbImage) -> Result<Vec<u8>, TranscodeError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(TranscodeError::InvalidDimensions { width, height });
        }

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(self.settings.quality as f32);
        if self.settings.progressive {
            comp.set_progressive_mode();
        }
        comp.set_optimize_coding(self.settings.optimize_coding);

        let mut comp = comp
            .start_compress(Vec::new())
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        comp.write_scanlines(img)
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        let jpeg_data = comp
            .finish()
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;

        Ok(jpeg_data)
    }
}
