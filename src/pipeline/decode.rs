//! Image decoding: raw bytes → validated pixels.
//!
//! The format is sniffed from the magic bytes, never trusted from a file
//! name. The image is always decoded in full, even for JPEGs that will later
//! be embedded byte-for-byte.
//!
//! The JPEG decoder pads short entropy-coded data instead of failing, so a
//! full decode alone does not catch a truncated scan. JPEGs must also pass
//! [`check_jpeg_structure`]: a start-of-scan segment is present and the
//! stream closes with an EOI marker.

use crate::error::Img2PdfError;
use crate::pipeline::input::ImageSource;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raster formats accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Png,
    Jpeg,
}

impl SourceFormat {
    fn image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// A successfully decoded image, ready for embedding.
#[derive(Debug)]
pub struct DecodedImage {
    pub format: SourceFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: DynamicImage,
    /// Colour components declared in the JPEG frame header. `None` for PNG.
    pub jpeg_components: Option<u8>,
}

/// Identify the format of `bytes` from its signature.
///
/// Returns `None` for anything that is not PNG or JPEG.
pub fn sniff_format(bytes: &[u8]) -> Option<SourceFormat> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some(SourceFormat::Png),
        ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
        _ => None,
    }
}

/// Decode `source`, which will become page `page` (1-indexed).
pub fn decode_image(source: &ImageSource, page: usize) -> Result<DecodedImage, Img2PdfError> {
    let bytes = source.bytes.as_slice();
    if bytes.is_empty() {
        return Err(Img2PdfError::decode(page, &source.name, "image buffer is empty"));
    }

    let format = sniff_format(bytes).ok_or_else(|| {
        Img2PdfError::decode(page, &source.name, "not a PNG or JPEG image")
    })?;

    if format == SourceFormat::Jpeg {
        check_jpeg_structure(bytes)
            .map_err(|detail| Img2PdfError::decode(page, &source.name, detail))?;
    }

    let pixels = image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(|e| Img2PdfError::decode(page, &source.name, e.to_string()))?;

    let (width, height) = (pixels.width(), pixels.height());
    if width == 0 || height == 0 {
        return Err(Img2PdfError::decode(
            page,
            &source.name,
            format!("image has zero dimension ({width}x{height})"),
        ));
    }

    let jpeg_components = match format {
        SourceFormat::Jpeg => jpeg_frame_components(bytes),
        SourceFormat::Png => None,
    };

    debug!(
        "Decoded page {} '{}': {:?} {}x{} {:?}",
        page,
        source.name,
        format,
        width,
        height,
        pixels.color()
    );

    Ok(DecodedImage {
        format,
        width,
        height,
        pixels,
        jpeg_components,
    })
}

/// Scan JPEG markers for the first start-of-frame segment and return its
/// component count (1 = gray, 3 = YCbCr/RGB, 4 = CMYK/YCCK).
pub fn jpeg_frame_components(bytes: &[u8]) -> Option<u8> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        // Fill bytes: any number of 0xFF may precede a marker.
        while pos < bytes.len() && bytes[pos] == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos)?;
        pos += 1;

        match marker {
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => continue,
            // EOI or SOS before any frame header.
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let len = u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]) as usize;
        if len < 2 {
            return None;
        }

        // SOF0–SOF15, excluding DHT (C4), JPG (C8) and DAC (CC).
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // length(2) precision(1) height(2) width(2) components(1)
            return bytes.get(pos + 7).copied();
        }

        pos += len;
    }
    None
}

/// Verify that a JPEG has scan data and is not cut short.
///
/// Trailing NUL or whitespace padding after the EOI marker is tolerated.
pub fn check_jpeg_structure(bytes: &[u8]) -> Result<(), &'static str> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err("missing JPEG start-of-image marker");
    }

    let mut pos = 2;
    let mut has_scan = false;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            return Err("malformed JPEG marker segment");
        }
        while pos < bytes.len() && bytes[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = bytes.get(pos) else { break };
        pos += 1;

        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 => return Err("JPEG ends before any scan data"),
            0xDA => {
                has_scan = true;
                break;
            }
            _ => {}
        }

        let (Some(&hi), Some(&lo)) = (bytes.get(pos), bytes.get(pos + 1)) else {
            break;
        };
        let len = u16::from_be_bytes([hi, lo]) as usize;
        if len < 2 {
            return Err("malformed JPEG marker segment");
        }
        pos += len;
    }

    if !has_scan {
        return Err("JPEG has no start-of-scan segment (truncated header)");
    }

    let end = bytes
        .iter()
        .rposition(|&b| !matches!(b, 0x00 | b' ' | b'\t' | b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    if !bytes[..end].ends_with(&[0xFF, 0xD9]) {
        return Err("JPEG is truncated (missing end-of-image marker)");
    }
    Ok(())
}
