//! # edgequake-img2pdf
//!
//! Convert PNG and JPEG images into a single multi-page PDF: one image per
//! page, each scaled to a fixed width with its aspect ratio preserved.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images
//!  │
//!  ├─ 1. Input    resolve local files or download URLs into memory
//!  ├─ 2. Decode   sniff PNG/JPEG, decode fully to validate
//!  ├─ 3. Place    500 pt wide, anchored 50 pt from the top-left corner
//!  ├─ 4. Embed    JPEG pass-through or Flate-compressed samples
//!  └─ 5. Compose  one US Letter page per image → PDF bytes
//! ```
//!
//! A conversion is all-or-nothing: if any image fails to decode, no
//! document is returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_img2pdf::{convert_to_file, ConversionConfig, DEFAULT_FILENAME};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let stats = convert_to_file(["cover.png", "page1.jpg"], DEFAULT_FILENAME, &config).await?;
//!     eprintln!("{} pages, {} bytes", stats.page_count, stats.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! Callers that already hold the image bytes can skip input resolution and
//! call [`convert_images`] or [`images_to_pdf`] directly; both are
//! synchronous.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-img2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod inspect;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_images, convert_sync, convert_to_file, images_to_pdf, write_atomic};
pub use error::Img2PdfError;
pub use inspect::{inspect_pdf, PageLayout, PlacedImage};
pub use layout::{place, Placement, MARGIN, MAX_IMAGE_WIDTH, PAGE_HEIGHT, PAGE_WIDTH};
pub use output::{ConversionOutput, ConversionStats, PageSummary, DEFAULT_FILENAME, PDF_MIME_TYPE};
pub use pipeline::decode::SourceFormat;
pub use pipeline::input::ImageSource;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
