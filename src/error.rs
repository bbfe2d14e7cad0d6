//! Error types for the edgequake-img2pdf library.
//!
//! A conversion is all-or-nothing: any failure aborts the whole document and
//! no partial PDF is ever returned. [`Img2PdfError`] is therefore the single
//! error type surfaced by every `convert*` function.
//!
//! The variants fall into a few classes:
//!
//! * **Input** — a path or URL could not be turned into bytes.
//! * **Decode** — bytes were obtained but are not a usable PNG/JPEG.
//!   See [`Img2PdfError::is_decode`].
//! * **Resource** — scratch or output files could not be created, written
//!   or moved into place.
//! * **Document** — the PDF object graph could not be serialised, or a PDF
//!   handed to [`crate::inspect::inspect_pdf`] could not be parsed.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-img2pdf library.
#[derive(Debug, Error)]
pub enum Img2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a usable file path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// Image bytes are empty, corrupt, zero-sized, or not PNG/JPEG.
    ///
    /// `page` is the 1-indexed position the image would have occupied
    /// (0 when the failure happened before the image had a position).
    #[error("Cannot decode image {page} ('{source_name}'): {detail}")]
    Decode {
        page: usize,
        source_name: String,
        detail: String,
    },

    /// No images were supplied.
    #[error("No images to convert.\nProvide at least one PNG or JPEG file.")]
    EmptyInput,

    // ── Resource errors ───────────────────────────────────────────────────
    /// Scratch storage could not be allocated, written or released.
    #[error("Scratch storage failure while {context}: {source}")]
    Resource {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Document errors ───────────────────────────────────────────────────
    /// The assembled PDF could not be serialised.
    #[error("Failed to assemble PDF: {0}")]
    PdfAssembly(String),

    /// A PDF given for inspection could not be parsed.
    #[error("PDF is corrupt: {0}")]
    CorruptPdf(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Img2PdfError {
    /// Build a [`Img2PdfError::Decode`] for the image at `page`.
    pub fn decode(page: usize, source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Img2PdfError::Decode {
            page,
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }

    /// True when the failure is caused by unusable image bytes.
    pub fn is_decode(&self) -> bool {
        matches!(self, Img2PdfError::Decode { .. })
    }

    /// True when the failure is caused by scratch or output storage.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Img2PdfError::Resource { .. } | Img2PdfError::OutputWriteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display_names_page_and_source() {
        let e = Img2PdfError::decode(3, "scan.png", "truncated IDAT");
        let msg = e.to_string();
        assert!(msg.contains("image 3"), "got: {msg}");
        assert!(msg.contains("scan.png"), "got: {msg}");
        assert!(msg.contains("truncated IDAT"), "got: {msg}");
        assert!(e.is_decode());
        assert!(!e.is_resource());
    }

    #[test]
    fn resource_display_includes_context() {
        let e = Img2PdfError::Resource {
            context: "creating scratch file".into(),
            source: std::io::Error::other("disk full"),
        };
        let msg = e.to_string();
        assert!(msg.contains("creating scratch file"));
        assert!(msg.contains("disk full"));
        assert!(e.is_resource());
    }

    #[test]
    fn empty_input_is_not_decode() {
        assert!(!Img2PdfError::EmptyInput.is_decode());
    }

    #[test]
    fn download_timeout_display() {
        let e = Img2PdfError::DownloadTimeout {
            url: "https://example.com/a.png".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("example.com"));
    }
}
