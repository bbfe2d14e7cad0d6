//! Input resolution: turn user-supplied paths or URLs into named byte buffers.
//!
//! The conversion routine only ever sees [`ImageSource`] values. Keeping the
//! bytes in memory means nothing is staged on disk: a download that fails
//! halfway leaves no file behind, and the buffers are released as soon as
//! the caller drops them.

use crate::error::Img2PdfError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extensions accepted for local inputs (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// An image to convert: a display name plus its encoded bytes.
///
/// The name is only used in log lines and error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Whether `path` carries one of the [`SUPPORTED_EXTENSIONS`].
///
/// Paths without an extension are accepted; their format is decided from
/// the magic bytes later on.
pub fn has_supported_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => SUPPORTED_EXTENSIONS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ext)),
    }
}

/// Resolve the input string to an in-memory image.
///
/// If the input is a URL, download it. Otherwise read it as a local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ImageSource, Img2PdfError> {
    if input.trim().is_empty() {
        return Err(Img2PdfError::InvalidInput {
            input: input.to_string(),
        });
    }

    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Read a local image file, validating existence, permissions and extension.
async fn read_local(path_str: &str) -> Result<ImageSource, Img2PdfError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Img2PdfError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(Img2PdfError::InvalidInput {
            input: path_str.to_string(),
        });
    }
    if !has_supported_extension(&path) {
        return Err(Img2PdfError::decode(
            0,
            path_str,
            format!(
                "unsupported file extension (expected one of: {})",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        ));
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Img2PdfError::PermissionDenied { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Img2PdfError::FileNotFound { path });
        }
        Err(e) => {
            return Err(Img2PdfError::Resource {
                context: format!("reading '{}'", path.display()),
                source: e,
            });
        }
    };

    debug!("Read local image: {} ({} bytes)", path.display(), bytes.len());
    Ok(ImageSource::new(display_name(&path), bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ImageSource, Img2PdfError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Img2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Img2PdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Img2PdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Img2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            Img2PdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Img2PdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(ImageSource::new(url_filename(url), bytes.to_vec()))
}

/// Last path segment of `url`, or the whole URL when it has none.
fn url_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    url.to_string()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/a.png"));
        assert!(is_url("http://example.com/a.jpg"));
        assert!(!is_url("/tmp/a.png"));
        assert!(!is_url("a.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(has_supported_extension(Path::new("a.png")));
        assert!(has_supported_extension(Path::new("a.JPG")));
        assert!(has_supported_extension(Path::new("dir/a.Jpeg")));
        assert!(has_supported_extension(Path::new("no_extension")));
        assert!(!has_supported_extension(Path::new("a.gif")));
        assert!(!has_supported_extension(Path::new("a.pdf")));
    }

    #[test]
    fn url_filename_uses_last_segment() {
        assert_eq!(url_filename("https://example.com/img/cat.png"), "cat.png");
        assert_eq!(url_filename("https://example.com/"), "https://example.com/");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.png", 5).await.unwrap_err();
        assert!(matches!(err, Img2PdfError::FileNotFound { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn empty_input_string_is_invalid() {
        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, Img2PdfError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn unsupported_extension_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, b"GIF89a").unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(err.is_decode(), "got: {err}");
    }

    #[tokio::test]
    async fn local_file_is_read_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFF").unwrap();
        let src = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(src.name, "photo.jpg");
        assert_eq!(src.bytes, b"\xFF\xD8\xFF");
    }
}
