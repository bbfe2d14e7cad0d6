//! Read a PDF back and report where each page's image was drawn.
//!
//! Only the shape this crate writes is understood: one image XObject per
//! page, positioned by a `cm` operator immediately before its `Do`. Pages
//! without an image are reported with `image: None`.

use crate::error::Img2PdfError;
use crate::layout::Placement;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

/// Layout of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Media box width and height in points.
    pub media_box: (f64, f64),
    pub image: Option<PlacedImage>,
}

/// An image XObject drawn on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    pub placement: Placement,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Stream filter, e.g. `DCTDecode` or `FlateDecode`.
    pub filter: Option<String>,
}

/// Inspect every page of the PDF in `bytes`.
pub fn inspect_pdf(bytes: &[u8]) -> Result<Vec<PageLayout>, Img2PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| Img2PdfError::CorruptPdf(e.to_string()))?;

    doc.get_pages()
        .into_iter()
        .map(|(num, page_id)| inspect_page(&doc, num as usize, page_id))
        .collect()
}

fn inspect_page(doc: &Document, page_num: usize, page_id: ObjectId) -> Result<PageLayout, Img2PdfError> {
    let corrupt = |detail: String| Img2PdfError::CorruptPdf(format!("page {page_num}: {detail}"));

    let page = doc.get_dictionary(page_id).map_err(|e| corrupt(e.to_string()))?;
    let media_box = media_box(doc, page).ok_or_else(|| corrupt("missing MediaBox".into()))?;

    let data = doc.get_page_content(page_id).map_err(|e| corrupt(e.to_string()))?;
    let content = Content::decode(&data).map_err(|e| corrupt(e.to_string()))?;

    let mut matrix: Option<[f64; 6]> = None;
    let mut drawn: Option<(Vec<u8>, [f64; 6])> = None;
    for op in &content.operations {
        match op.operator.as_str() {
            "cm" => {
                let nums: Vec<f64> = op
                    .operands
                    .iter()
                    .filter_map(|o| o.as_float().ok().map(f64::from))
                    .collect();
                if let [a, b, c, d, e, f] = nums[..] {
                    matrix = Some([a, b, c, d, e, f]);
                }
            }
            "Do" => {
                if let (Some(name), Some(m)) = (op.operands.first(), matrix) {
                    if let Ok(name) = name.as_name() {
                        drawn = Some((name.to_vec(), m));
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    let image = match drawn {
        None => None,
        Some((name, [a, _, _, d, e, f])) => {
            let xobject = find_xobject(doc, page, &name)
                .ok_or_else(|| corrupt(format!("XObject /{} not found", String::from_utf8_lossy(&name))))?;
            let dim = |key: &[u8]| {
                xobject
                    .get(key)
                    .and_then(Object::as_i64)
                    .ok()
                    .and_then(|v| u32::try_from(v).ok())
            };
            Some(PlacedImage {
                placement: Placement {
                    x: e,
                    y: f,
                    width: a,
                    height: d,
                },
                pixel_width: dim(b"Width").unwrap_or(0),
                pixel_height: dim(b"Height").unwrap_or(0),
                filter: xobject
                    .get(b"Filter")
                    .and_then(Object::as_name)
                    .ok()
                    .map(|n| String::from_utf8_lossy(n).into_owned()),
            })
        }
    };

    Ok(PageLayout {
        page_num,
        media_box,
        image,
    })
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Limit on `/Parent` hops when looking up an inherited attribute.
const MAX_INHERIT_DEPTH: usize = 32;

/// `MediaBox` is inheritable: fall back to the nearest ancestor in the page
/// tree that defines one.
fn media_box(doc: &Document, page: &Dictionary) -> Option<(f64, f64)> {
    let mut node = page;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(obj) = node.get(b"MediaBox") {
            return box_size(doc, obj);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn box_size(doc: &Document, obj: &Object) -> Option<(f64, f64)> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    let nums: Vec<f64> = arr
        .iter()
        .filter_map(|o| resolve(doc, o)?.as_float().ok().map(f64::from))
        .collect();
    match nums[..] {
        [x0, y0, x1, y1] => Some((x1 - x0, y1 - y0)),
        _ => None,
    }
}

fn find_xobject<'a>(doc: &'a Document, page: &'a Dictionary, name: &[u8]) -> Option<&'a Dictionary> {
    let resources = resolve(doc, page.get(b"Resources").ok()?)?.as_dict().ok()?;
    let xobjects = resolve(doc, resources.get(b"XObject").ok()?)?.as_dict().ok()?;
    let stream = resolve(doc, xobjects.get(name).ok()?)?.as_stream().ok()?;
    Some(&stream.dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_corrupt_pdf() {
        let err = inspect_pdf(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, Img2PdfError::CorruptPdf(_)), "got: {err}");
    }

    #[test]
    fn media_box_inherited_from_pages_node() {
        use lopdf::content::Operation;
        use lopdf::{dictionary, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0, 255],
        ));
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![500.into(), 0.into(), 0.into(), 250.into(), 50.into(), 545.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let pages = inspect_pdf(&bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].media_box, (595.0, 842.0));
        let img = pages[0].image.as_ref().unwrap();
        assert_eq!((img.pixel_width, img.pixel_height), (2, 1));
        assert!((img.placement.y - 545.0).abs() < 1e-3);
    }

    #[test]
    fn reads_back_composed_page() {
        use crate::pipeline::compose::{DocumentInfo, PdfComposer};
        use crate::pipeline::embed::EmbeddedImage;
        use lopdf::{dictionary, Stream};

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0; 8],
        );
        let mut composer = PdfComposer::new();
        composer
            .add_image_page(
                EmbeddedImage {
                    image,
                    smask: None,
                    passthrough: false,
                },
                &crate::layout::place(4, 2).unwrap(),
            )
            .unwrap();
        let bytes = composer.finish(&DocumentInfo::default()).unwrap();

        let pages = inspect_pdf(&bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].media_box, (612.0, 792.0));
        let img = pages[0].image.as_ref().unwrap();
        assert_eq!((img.pixel_width, img.pixel_height), (4, 2));
        assert!((img.placement.width - 500.0).abs() < 1e-3);
        assert!((img.placement.height - 250.0).abs() < 1e-3);
        assert!((img.placement.x - 50.0).abs() < 1e-3);
        assert!((img.placement.y - 492.0).abs() < 1e-3);
        assert_eq!(img.filter, None);
    }
}
