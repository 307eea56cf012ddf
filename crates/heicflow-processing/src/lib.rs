//! heicflow processing library
//!
//! The transcode stage: decoding HEIC/HEIF sources to RGB pixels and encoding
//! them as progressive JPEG with mozjpeg.
//!
//! Decoding sits behind [`HeifDecoder`] so the encoder and the file-level
//! [`HeicTranscoder`] can be exercised without the native libheif library.

pub mod decoder;
pub mod error;
#[cfg(feature = "heif")]
pub mod heif;
pub mod inspect;
pub mod jpeg;
pub mod transcoder;

pub use decoder::HeifDecoder;
pub use error::TranscodeError;
#[cfg(feature = "heif")]
pub use heif::LibHeifDecoder;
pub use inspect::{scan_mode, ScanMode};
pub use jpeg::{JpegEncoder, JpegSettings};
pub use transcoder::{HeicTranscoder, ImageTranscoder, TranscodeReport};
