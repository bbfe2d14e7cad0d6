//! Output types: the finished document plus per-page and overall statistics.

use crate::layout::Placement;
use crate::pipeline::decode::SourceFormat;
use serde::{Deserialize, Serialize};

/// Suggested file name when offering the document for download.
pub const DEFAULT_FILENAME: &str = "converted_images.pdf";

/// MIME type of the produced document.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// The result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The complete PDF document.
    #[serde(skip)]
    pub pdf: Vec<u8>,

    /// One entry per page, in page order.
    pub pages: Vec<PageSummary>,

    pub stats: ConversionStats,
}

/// What ended up on a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Name of the image the page was built from.
    pub source: String,
    pub format: SourceFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub placement: Placement,
    /// True when JPEG bytes were embedded without re-encoding.
    pub passthrough: bool,
}

/// Aggregate statistics for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub page_count: usize,
    /// Sum of the encoded input image sizes.
    pub input_bytes: u64,
    /// Size of the produced PDF.
    pub output_bytes: u64,
    pub total_duration_ms: u64,
}
