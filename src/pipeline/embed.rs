//! Image embedding: `DecodedImage` → PDF image XObject streams.
//!
//! Baseline and progressive JPEGs with 1 or 3 components are stored as-is
//! under `/DCTDecode`; re-encoding them would lose quality and inflate the
//! file. Everything else is normalised to 8-bit Gray or RGB samples and
//! Flate-compressed, with any alpha channel split into a `/SMask`.

use crate::error::Img2PdfError;
use crate::pipeline::decode::{DecodedImage, SourceFormat};
use crate::pipeline::input::ImageSource;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::DynamicImage;
use lopdf::{dictionary, Stream};
use std::io::Write;
use tracing::debug;

/// The streams needed to draw one image.
#[derive(Debug)]
pub struct EmbeddedImage {
    pub image: Stream,
    /// Soft mask for images with transparency.
    pub smask: Option<Stream>,
    /// Whether the source bytes were embedded without re-encoding.
    pub passthrough: bool,
}

/// Build the XObject streams for `decoded`, which came from `source`.
pub fn embed_image(
    source: &ImageSource,
    decoded: &DecodedImage,
    page: usize,
) -> Result<EmbeddedImage, Img2PdfError> {
    if decoded.format == SourceFormat::Jpeg {
        if let Some(color_space) = decoded.jpeg_components.and_then(dct_color_space) {
            debug!("Page {}: embedding JPEG as-is ({})", page, color_space);
            return Ok(EmbeddedImage {
                image: image_stream(
                    decoded.width,
                    decoded.height,
                    color_space,
                    "DCTDecode",
                    source.bytes.clone(),
                ),
                smask: None,
                passthrough: true,
            });
        }
    }

    let (color_space, samples, alpha) = split_samples(&decoded.pixels);
    let data = deflate(&samples).map_err(|e| Img2PdfError::Resource {
        context: format!("compressing image data for page {page}"),
        source: e,
    })?;

    let smask = match alpha {
        Some(alpha) if alpha.iter().any(|&a| a != u8::MAX) => {
            let mask = deflate(&alpha).map_err(|e| Img2PdfError::Resource {
                context: format!("compressing soft mask for page {page}"),
                source: e,
            })?;
            Some(image_stream(
                decoded.width,
                decoded.height,
                "DeviceGray",
                "FlateDecode",
                mask,
            ))
        }
        _ => None,
    };

    debug!(
        "Page {}: re-encoded {} samples → {} bytes (smask: {})",
        page,
        color_space,
        data.len(),
        smask.is_some()
    );

    Ok(EmbeddedImage {
        image: image_stream(decoded.width, decoded.height, color_space, "FlateDecode", data),
        smask,
        passthrough: false,
    })
}

fn dct_color_space(components: u8) -> Option<&'static str> {
    match components {
        1 => Some("DeviceGray"),
        3 => Some("DeviceRGB"),
        _ => None,
    }
}

/// Split pixels into 8-bit colour samples and an optional alpha plane.
fn split_samples(img: &DynamicImage) -> (&'static str, Vec<u8>, Option<Vec<u8>>) {
    let color = img.color();
    let gray = !color.has_color();

    match (gray, color.has_alpha()) {
        (true, false) => ("DeviceGray", img.to_luma8().into_raw(), None),
        (false, false) => ("DeviceRGB", img.to_rgb8().into_raw(), None),
        (true, true) => {
            let raw = img.to_luma_alpha8().into_raw();
            let mut samples = Vec::with_capacity(raw.len() / 2);
            let mut alpha = Vec::with_capacity(raw.len() / 2);
            for px in raw.chunks_exact(2) {
                samples.push(px[0]);
                alpha.push(px[1]);
            }
            ("DeviceGray", samples, Some(alpha))
        }
        (false, true) => {
            let raw = img.to_rgba8().into_raw();
            let mut samples = Vec::with_capacity(raw.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(raw.len() / 4);
            for px in raw.chunks_exact(4) {
                samples.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
            ("DeviceRGB", samples, Some(alpha))
        }
    }
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn image_stream(width: u32, height: u32, color_space: &str, filter: &str, data: Vec<u8>) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => filter,
    };
    // Already encoded: lopdf must not compress it a second time.
    Stream::new(dict, data).with_compression(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::decode::decode_image;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn source(img: DynamicImage, format: ImageFormat, name: &str) -> ImageSource {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        ImageSource::new(name, buf)
    }

    fn name(stream: &Stream, key: &[u8]) -> Vec<u8> {
        stream.dict.get(key).unwrap().as_name().unwrap().to_vec()
    }

    #[test]
    fn rgb_jpeg_passes_through() {
        let src = source(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([1, 2, 3]))),
            ImageFormat::Jpeg,
            "a.jpg",
        );
        let decoded = decode_image(&src, 1).unwrap();
        let e = embed_image(&src, &decoded, 1).unwrap();
        assert!(e.passthrough);
        assert!(e.smask.is_none());
        assert_eq!(e.image.content, src.bytes);
        assert_eq!(name(&e.image, b"Filter"), b"DCTDecode");
        assert_eq!(name(&e.image, b"ColorSpace"), b"DeviceRGB");
        assert_eq!(e.image.dict.get(b"Width").unwrap().as_i64().unwrap(), 20);
        assert_eq!(e.image.dict.get(b"Height").unwrap().as_i64().unwrap(), 10);
    }

    #[test]
    fn opaque_png_is_flate_rgb_without_mask() {
        let src = source(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))),
            ImageFormat::Png,
            "opaque.png",
        );
        let decoded = decode_image(&src, 1).unwrap();
        let e = embed_image(&src, &decoded, 1).unwrap();
        assert!(!e.passthrough);
        assert!(e.smask.is_none(), "fully opaque alpha needs no soft mask");
        assert_eq!(name(&e.image, b"Filter"), b"FlateDecode");
        assert_eq!(name(&e.image, b"ColorSpace"), b"DeviceRGB");
    }

    #[test]
    fn translucent_png_gets_smask() {
        let src = source(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 100]))),
            ImageFormat::Png,
            "glass.png",
        );
        let decoded = decode_image(&src, 1).unwrap();
        let e = embed_image(&src, &decoded, 1).unwrap();
        let smask = e.smask.expect("soft mask");
        assert_eq!(name(&smask, b"ColorSpace"), b"DeviceGray");
    }

    #[test]
    fn gray_png_stays_gray() {
        let src = source(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([77]))),
            ImageFormat::Png,
            "gray.png",
        );
        let decoded = decode_image(&src, 1).unwrap();
        let e = embed_image(&src, &decoded, 1).unwrap();
        assert_eq!(name(&e.image, b"ColorSpace"), b"DeviceGray");
    }

    #[test]
    fn flate_payload_inflates_to_raw_samples() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let src = source(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([5, 6, 7]))),
            ImageFormat::Png,
            "tiny.png",
        );
        let decoded = decode_image(&src, 1).unwrap();
        let e = embed_image(&src, &decoded, 1).unwrap();
        let mut raw = Vec::new();
        ZlibDecoder::new(e.image.content.as_slice())
            .read_to_end(&mut raw)
            .unwrap();
        assert_eq!(raw, [5, 6, 7].repeat(4));
    }
}
