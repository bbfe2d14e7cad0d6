//! Pipeline stages for image-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ embed ──▶ compose
//! (path/URL) (pixels)  (XObject) (pages → bytes)
//! ```
//!
//! 1. [`input`]   — read a local file or download a URL into an
//!    [`input::ImageSource`]
//! 2. [`decode`]  — sniff PNG/JPEG from magic bytes and decode fully, so
//!    corrupt data is caught before anything is written
//! 3. [`embed`]   — build the image XObject: JPEG pass-through or
//!    Flate-compressed samples with an optional soft mask
//! 4. [`compose`] — append one page per image and serialise the document

pub mod compose;
pub mod decode;
pub mod embed;
pub mod input;
