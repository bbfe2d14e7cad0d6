//! Page composition: build the PDF object graph one image page at a time.
//!
//! A page is appended only when an image is placed on it, so N images always
//! produce exactly N pages; there is no "current page" that could be left
//! dangling (and blank) after the last image.

use crate::error::Img2PdfError;
use crate::layout::{Placement, PAGE_HEIGHT, PAGE_WIDTH};
use crate::pipeline::embed::EmbeddedImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// PDF version written in the file header.
pub const PDF_VERSION: &str = "1.5";

/// Document-level metadata written to the `/Info` dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub producer: String,
}

/// Incremental builder for the output document.
pub struct PdfComposer {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfComposer {
    pub fn new() -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page that draws `image` at `placement`.
    pub fn add_image_page(
        &mut self,
        image: EmbeddedImage,
        placement: &Placement,
    ) -> Result<ObjectId, Img2PdfError> {
        let page_num = self.kids.len() + 1;
        let xobject_name = format!("Im{page_num}");

        let mut image_stream = image.image;
        if let Some(smask) = image.smask {
            let smask_id = self.doc.add_object(smask);
            image_stream.dict.set("SMask", smask_id);
        }
        let image_id = self.doc.add_object(image_stream);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(placement.width),
                        0.into(),
                        0.into(),
                        real(placement.height),
                        real(placement.x),
                        real(placement.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(xobject_name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| Img2PdfError::PdfAssembly(format!("page {page_num} content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content_bytes));

        let mut xobjects = Dictionary::new();
        xobjects.set(xobject_name, image_id);

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
            "Resources" => dictionary! {
                "XObject" => xobjects,
            },
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());

        debug!(
            "Composed page {}: {:.2}x{:.2} at ({:.2}, {:.2})",
            page_num, placement.width, placement.height, placement.x, placement.y
        );
        Ok(page_id)
    }

    /// Close the page tree and serialise the document.
    pub fn finish(mut self, info: &DocumentInfo) -> Result<Vec<u8>, Img2PdfError> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut info_dict = dictionary! {
            "Producer" => Object::string_literal(info.producer.as_str()),
        };
        if let Some(title) = &info.title {
            info_dict.set("Title", Object::string_literal(title.as_str()));
        }
        let info_id = self.doc.add_object(info_dict);
        self.doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Img2PdfError::PdfAssembly(e.to_string()))?;
        Ok(out)
    }
}

fn real(v: f64) -> Object {
    Object::Real((v as f32).into())
}
