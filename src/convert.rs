//! Conversion entry points.
//!
//! [`convert_images`] is the routine everything else wraps: it is
//! synchronous, single-threaded and works purely on in-memory buffers.
//! The `async` functions add input resolution (paths and URLs), an atomic
//! file sink and a blocking wrapper for non-async callers.

use crate::config::ConversionConfig;
use crate::error::Img2PdfError;
use crate::layout;
use crate::output::{ConversionOutput, ConversionStats, PageSummary};
use crate::pipeline::compose::{DocumentInfo, PdfComposer};
use crate::pipeline::{decode, embed, input};
use crate::pipeline::input::ImageSource;
use crate::progress::ProgressCallback;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Value of the `/Producer` entry in every document.
pub const PRODUCER: &str = concat!("edgequake-img2pdf ", env!("CARGO_PKG_VERSION"));

/// Convert images to a PDF with the default configuration.
///
/// Shorthand for [`convert_images`] when only the bytes are wanted.
///
/// ```rust,no_run
/// use edgequake_img2pdf::{images_to_pdf, ImageSource};
///
/// let images = vec![
///     ImageSource::new("a.png", std::fs::read("a.png")?),
///     ImageSource::new("b.jpg", std::fs::read("b.jpg")?),
/// ];
/// let pdf = images_to_pdf(&images)?;
/// std::fs::write("converted_images.pdf", pdf)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn images_to_pdf(images: &[ImageSource]) -> Result<Vec<u8>, Img2PdfError> {
    convert_images(images, &ConversionConfig::default()).map(|out| out.pdf)
}

/// Convert an ordered list of images into a PDF, one image per page.
///
/// Each image is drawn 500 pt wide with its aspect ratio preserved,
/// anchored 50 pt from the top-left corner of a US Letter page.
///
/// # Errors
/// * [`Img2PdfError::EmptyInput`] — `images` is empty
/// * [`Img2PdfError::Decode`] — any image is empty, corrupt, zero-sized or
///   not PNG/JPEG; no document is produced
/// * [`Img2PdfError::PdfAssembly`] — serialisation failed
pub fn convert_images(
    images: &[ImageSource],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Img2PdfError> {
    let start = Instant::now();
    let total = images.len();
    if total == 0 {
        return Err(Img2PdfError::EmptyInput);
    }
    info!("Converting {} image(s) to PDF", total);

    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_conversion_start(total);
    }

    let mut composer = PdfComposer::new();
    let mut pages = Vec::with_capacity(total);

    for (idx, source) in images.iter().enumerate() {
        let page_num = idx + 1;
        if let Some(cb) = progress {
            cb.on_image_start(page_num, total);
        }

        let summary = compose_page(&mut composer, source, page_num)
            .inspect_err(|e| report_error(progress, page_num, total, e))?;

        if let Some(cb) = progress {
            cb.on_image_complete(page_num, total, &summary.placement);
        }
        pages.push(summary);
    }

    let info = DocumentInfo {
        title: config.title.clone(),
        producer: PRODUCER.to_string(),
    };
    let pdf = composer.finish(&info)?;

    let stats = ConversionStats {
        page_count: pages.len(),
        input_bytes: images.iter().map(|s| s.bytes.len() as u64).sum(),
        output_bytes: pdf.len() as u64,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    if let Some(cb) = progress {
        cb.on_conversion_complete(total, stats.page_count);
    }
    info!(
        "Converted {} page(s): {} bytes in → {} bytes out in {}ms",
        stats.page_count, stats.input_bytes, stats.output_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput { pdf, pages, stats })
}

/// Decode, place and embed one image. All per-image buffers are dropped
/// when this returns, on success and on error alike.
fn compose_page(
    composer: &mut PdfComposer,
    source: &ImageSource,
    page_num: usize,
) -> Result<PageSummary, Img2PdfError> {
    let decoded = decode::decode_image(source, page_num)?;
    let placement = layout::place(decoded.width, decoded.height).map_err(|e| match e {
        Img2PdfError::Decode { detail, .. } => Img2PdfError::decode(page_num, &source.name, detail),
        other => other,
    })?;
    let embedded = embed::embed_image(source, &decoded, page_num)?;
    let passthrough = embedded.passthrough;

    composer.add_image_page(embedded, &placement)?;

    Ok(PageSummary {
        page_num,
        source: source.name.clone(),
        format: decoded.format,
        pixel_width: decoded.width,
        pixel_height: decoded.height,
        placement,
        passthrough,
    })
}

fn report_error(progress: Option<&ProgressCallback>, page_num: usize, total: usize, e: &Img2PdfError) {
    warn!("Image {}/{} failed: {}", page_num, total, e);
    if let Some(cb) = progress {
        cb.on_image_error(page_num, total, &e.to_string());
    }
}

/// Resolve `inputs` (local paths or HTTP/HTTPS URLs) and convert them.
///
/// Inputs are resolved in order; the first failure aborts the conversion.
/// The CPU-bound routine runs on Tokio's blocking pool.
pub async fn convert<I, S>(inputs: I, config: &ConversionConfig) -> Result<ConversionOutput, Img2PdfError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sources = Vec::new();
    for (idx, raw) in inputs.into_iter().enumerate() {
        let raw = raw.as_ref();
        let source = input::resolve_input(raw, config.download_timeout_secs)
            .await
            .map_err(|e| match e {
                Img2PdfError::Decode {
                    page: 0,
                    source_name,
                    detail,
                } => Img2PdfError::decode(idx + 1, source_name, detail),
                other => other,
            })?;
        debug!("Resolved input {}: '{}' ({} bytes)", idx + 1, raw, source.bytes.len());
        sources.push(source);
    }

    let config = config.clone();
    tokio::task::spawn_blocking(move || convert_images(&sources, &config))
        .await
        .map_err(|e| Img2PdfError::Internal(format!("Conversion task panicked: {e}")))?
}

/// Convert `inputs` and write the PDF to `output_path`.
///
/// The write is atomic: the document goes to a scratch file in the
/// destination directory and is renamed over `output_path` only once it is
/// complete. On failure the scratch file is removed and `output_path` is
/// left untouched.
pub async fn convert_to_file<I, S>(
    inputs: I,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Img2PdfError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let output = convert(inputs, config).await?;
    let path = output_path.as_ref().to_path_buf();

    let stats = output.stats.clone();
    tokio::task::spawn_blocking(move || write_atomic(&path, &output.pdf))
        .await
        .map_err(|e| Img2PdfError::Internal(format!("Write task panicked: {e}")))??;

    Ok(stats)
}

/// Write `bytes` to `path` through a scratch file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Img2PdfError> {
    let write_err = |source: std::io::Error| Img2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().map_err(write_err)?,
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut scratch = tempfile::Builder::new()
        .prefix(".img2pdf-")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(|source| Img2PdfError::Resource {
            context: format!("creating scratch file in '{}'", parent.display()),
            source,
        })?;

    if let Err(e) = scratch.write_all(bytes).and_then(|_| scratch.as_file().sync_all()) {
        discard_scratch(scratch);
        return Err(write_err(e));
    }

    scratch.persist(path).map_err(|e| {
        let source = e.error;
        discard_scratch(e.file);
        write_err(source)
    })?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Remove a scratch file, logging (never returning) any failure.
fn discard_scratch(file: tempfile::NamedTempFile) {
    let scratch_path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        warn!("Failed to remove scratch file {}: {}", scratch_path.display(), e);
    }
}

/// Blocking wrapper around [`convert`] for non-async callers.
///
/// Must not be called from inside a Tokio runtime.
pub fn convert_sync<I, S>(inputs: I, config: &ConversionConfig) -> Result<ConversionOutput, Img2PdfError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| Img2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(inputs, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> ImageSource {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 100, 50])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        ImageSource::new(format!("{w}x{h}.png"), buf)
    }

    #[test]
    fn empty_input_fails_fast() {
        let err = images_to_pdf(&[]).unwrap_err();
        assert!(matches!(err, Img2PdfError::EmptyInput));
    }

    #[test]
    fn summaries_follow_input_order() {
        let out = convert_images(&[png(10, 20), png(30, 10)], &ConversionConfig::default()).unwrap();
        assert_eq!(out.pages.len(), 2);
        assert_eq!(out.pages[0].source, "10x20.png");
        assert_eq!(out.pages[1].page_num, 2);
        assert!((out.pages[0].placement.height - 1000.0).abs() < 1e-9);
        assert_eq!(out.stats.page_count, 2);
        assert_eq!(out.stats.output_bytes, out.pdf.len() as u64);
    }

    #[test]
    fn decode_error_carries_page_number() {
        let bad = ImageSource::new("broken.png", b"\x89PNG\r\n\x1a\nnope".to_vec());
        let err = convert_images(&[png(2, 2), bad], &ConversionConfig::default()).unwrap_err();
        match err {
            Img2PdfError::Decode { page, source_name, .. } => {
                assert_eq!(page, 2);
                assert_eq!(source_name, "broken.png");
            }
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn producer_mentions_crate() {
        assert!(PRODUCER.starts_with("edgequake-img2pdf "));
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"old").unwrap();
        write_atomic(&path, b"%PDF-new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-new");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "scratch file must not linger");
    }

    #[test]
    fn write_atomic_failure_cleans_up_scratch() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail.
        let path = dir.path().join("out.pdf");
        std::fs::create_dir(&path).unwrap();

        let err = write_atomic(&path, b"%PDF").unwrap_err();
        assert!(err.is_resource(), "got: {err}");
        assert!(matches!(err, Img2PdfError::OutputWriteFailed { path: ref p, .. } if *p == path));
        assert!(path.is_dir());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".img2pdf-"))
            .collect();
        assert!(leftovers.is_empty(), "scratch files left behind: {leftovers:?}");
    }

    #[test]
    fn write_atomic_into_missing_directory_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.pdf");
        write_atomic(&path, b"%PDF").unwrap();
        assert!(path.exists());
    }
}
