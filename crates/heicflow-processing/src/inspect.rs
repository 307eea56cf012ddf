//! Minimal JPEG marker inspection

/// How the frame of a JPEG is encoded, from its start-of-frame marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Baseline,
    Extended,
    Progressive,
    Lossless,
}

/// Walk JPEG segment markers up to the first start-of-frame and report its mode.
///
/// Returns `None` for data that is not a JPEG or has no frame header.
pub fn scan_mode(data: &[u8]) -> Option<ScanMode> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        match marker {
            0xC0 => return Some(ScanMode::Baseline),
            0xC1 => return Some(ScanMode::Extended),
            0xC2 => return Some(ScanMode::Progressive),
            0xC3 => return Some(ScanMode::Lossless),
            // Start of scan or end of image before any frame header
            0xDA | 0xD9 => return None,
            _ => {}
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 {
            return None;
        }
        pos += 2 + len;
    }
    None
}
