//! Fixed page geometry and image placement.
//!
//! Every page is US Letter and every image is drawn 500 pt wide, anchored
//! 50 pt from the left edge and 50 pt below the top edge. PDF user space
//! has its origin at the bottom-left corner, so the anchor's `y` is
//! `PAGE_HEIGHT - height - MARGIN`.
//!
//! Height follows the source aspect ratio and is not clamped: a very tall
//! image runs off the bottom of the page (negative `y`).

use crate::error::Img2PdfError;
use serde::{Deserialize, Serialize};

/// Page width in points (US Letter).
pub const PAGE_WIDTH: f64 = 612.0;

/// Page height in points (US Letter).
pub const PAGE_HEIGHT: f64 = 792.0;

/// Distance of the image from the left and top page edges, in points.
pub const MARGIN: f64 = 50.0;

/// On-page width of every image, in points.
pub const MAX_IMAGE_WIDTH: f64 = 500.0;

/// Where and how large an image is drawn on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Bottom edge (PDF user space).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Compute the placement of an image of `width_px` × `height_px` pixels.
///
/// Fails when either dimension is zero: the aspect ratio is undefined and
/// a zero-height image would draw nothing.
pub fn place(width_px: u32, height_px: u32) -> Result<Placement, Img2PdfError> {
    if width_px == 0 || height_px == 0 {
        return Err(Img2PdfError::decode(
            0,
            "",
            format!("image has zero dimension ({width_px}x{height_px})"),
        ));
    }

    let aspect = f64::from(height_px) / f64::from(width_px);
    let width = MAX_IMAGE_WIDTH;
    let height = width * aspect;

    Ok(Placement {
        x: MARGIN,
        y: PAGE_HEIGHT - height - MARGIN,
        width,
        height,
    })
}
