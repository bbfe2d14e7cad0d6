//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as each image is decoded and placed on its page.
//!
//! # Example
//!
//! ```rust
//! use edgequake_img2pdf::{ConversionConfig, ConversionProgressCallback, Placement};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     placed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, page_num: usize, total: usize, placement: &Placement) {
//!         self.placed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {:.0}pt tall", page_num, total, placement.height);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { placed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::layout::Placement;
use std::sync::Arc;

/// Called by the conversion routine as it processes each image.
///
/// Images are processed sequentially, so calls never overlap within one
/// conversion. Implementations must still be `Send + Sync` because the
/// async entry points run the routine on Tokio's blocking pool. All methods
/// default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first image is decoded.
    fn on_conversion_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called before an image is decoded.
    ///
    /// # Arguments
    /// * `page_num` — 1-indexed page the image will occupy
    /// * `total`    — number of images in this conversion
    fn on_image_start(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called after the image's page has been composed.
    fn on_image_complete(&self, page_num: usize, total: usize, placement: &Placement) {
        let _ = (page_num, total, placement);
    }

    /// Called when an image fails. The conversion aborts right after.
    fn on_image_error(&self, page_num: usize, total: usize, error: &str) {
        let _ = (page_num, total, error);
    }

    /// Called once after the document has been serialised.
    fn on_conversion_complete(&self, total_images: usize, pages_written: usize) {
        let _ = (total_images, pages_written);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
