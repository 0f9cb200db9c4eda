//! Whole-document decoration passes: watermark and page numbers.
//!
//! Both passes run over the already-composited bundle and preserve page
//! count, order and each page's own dimensions.
//!
//! # Content layering
//!
//! A PDF page paints its content streams in order, so "beneath" means
//! "earlier in the Contents array". The watermark pass prepends the
//! template stream to every page: watermark ink first, original ink on
//! top, keeping the original fully legible. The numbering pass appends its
//! stamp so the number paints over everything.
//!
//! # The shared template
//!
//! One watermark template serves every page. The template's content stream
//! is cloned into a fresh object per page before merging; stamping a shared
//! mutable object would accumulate every page's merge into the template
//! itself and corrupt it after the first use.

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

use super::font::FontMetrics;
use super::page::{A4_HEIGHT, A4_WIDTH, encode_ops, helvetica_font_dict, show_text_op};

/// Watermark text size in points.
const WATERMARK_FONT_SIZE: f32 = 60.0;

/// Fill alpha of the generated watermark.
const WATERMARK_ALPHA: f32 = 0.15;

/// Gray level of the generated watermark text.
const WATERMARK_GRAY: f32 = 0.5;

/// Font resource name used by the generated watermark.
const WATERMARK_FONT: &str = "Fwm";

/// ExtGState resource name used by the generated watermark.
const WATERMARK_GSTATE: &str = "GSwm";

/// Page number font size in points.
const PAGE_NUMBER_SIZE: f32 = 11.0;

/// Baseline distance of the page number from the bottom edge.
const PAGE_NUMBER_BOTTOM_OFFSET: f32 = 30.0;

/// Font resource name used by the numbering stamp.
const PAGE_NUMBER_FONT: &str = "Fpg";

// =============================================================================
// Watermark Layer
// =============================================================================

/// The reusable watermark template.
///
/// Either generated (rotated translucent text on A4 coordinates) or loaded
/// from a single-page asset PDF. Immutable once constructed; stamping works
/// on per-page clones only.
pub struct WatermarkLayer {
    source: LayerSource,
}

enum LayerSource {
    Generated { text: String },
    Asset { bytes: Vec<u8> },
}

impl WatermarkLayer {
    /// A programmatically generated watermark: `text` drawn large,
    /// translucent and rotated 45° around the A4 page center.
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            source: LayerSource::Generated { text: text.into() },
        }
    }

    /// Use the first page of `bytes` (a PDF) as the template.
    ///
    /// Validated eagerly so a broken asset aborts before any output exists.
    pub fn from_asset_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes)
            .map_err(|e| Error::WatermarkAsset(format!("not a readable PDF: {e}")))?;
        if doc.get_pages().is_empty() {
            return Err(Error::WatermarkAsset("asset PDF has no pages".to_string()));
        }
        Ok(Self {
            source: LayerSource::Asset { bytes },
        })
    }

    /// Install the template's objects into `doc` once, returning the
    /// content bytes to clone per page and the resources those bytes need.
    fn prepare(&self, doc: &mut Document, metrics: FontMetrics) -> Result<PreparedLayer> {
        match &self.source {
            LayerSource::Generated { text } => prepare_generated(doc, text, metrics),
            LayerSource::Asset { bytes } => prepare_asset(doc, bytes),
        }
    }
}

/// Template ready for stamping into one specific document.
struct PreparedLayer {
    /// Content stream bytes, wrapped in q/Q. Cloned per page.
    content: Vec<u8>,
    /// Resources the content references; object references point into the
    /// target document.
    resources: Dictionary,
}

fn prepare_generated(
    doc: &mut Document,
    text: &str,
    metrics: FontMetrics,
) -> Result<PreparedLayer> {
    let font_id = doc.add_object(helvetica_font_dict());
    let gstate_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"ExtGState".to_vec())),
        ("ca", Object::Real(WATERMARK_ALPHA)),
        ("CA", Object::Real(WATERMARK_ALPHA)),
    ]));

    // 45° rotation around the A4 center; the baseline is shifted back by
    // half the text width so the text is centered on the page.
    let cos = std::f32::consts::FRAC_1_SQRT_2;
    let sin = cos;
    let text_width = metrics.string_width(text, WATERMARK_FONT_SIZE)?;
    let tx = A4_WIDTH / 2.0 - (text_width / 2.0) * cos;
    let ty = A4_HEIGHT / 2.0 - (text_width / 2.0) * sin;

    let ops = vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![WATERMARK_GSTATE.into()]),
        Operation::new(
            "rg",
            vec![
                WATERMARK_GRAY.into(),
                WATERMARK_GRAY.into(),
                WATERMARK_GRAY.into(),
            ],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![WATERMARK_FONT.into(), WATERMARK_FONT_SIZE.into()],
        ),
        Operation::new(
            "Tm",
            vec![
                cos.into(),
                sin.into(),
                (-sin).into(),
                cos.into(),
                tx.into(),
                ty.into(),
            ],
        ),
        show_text_op(text, metrics)?,
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ];

    let resources = Dictionary::from_iter([
        (
            "Font",
            Object::Dictionary(Dictionary::from_iter([(
                WATERMARK_FONT,
                Object::Reference(font_id),
            )])),
        ),
        (
            "ExtGState",
            Object::Dictionary(Dictionary::from_iter([(
                WATERMARK_GSTATE,
                Object::Reference(gstate_id),
            )])),
        ),
    ]);

    Ok(PreparedLayer {
        content: encode_ops(ops)?,
        resources,
    })
}

fn prepare_asset(doc: &mut Document, bytes: &[u8]) -> Result<PreparedLayer> {
    let mut asset = Document::load_mem(bytes)
        .map_err(|e| Error::WatermarkAsset(format!("not a readable PDF: {e}")))?;

    asset.renumber_objects_with(doc.max_id + 1);

    let first_page_id = *asset
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| Error::WatermarkAsset("asset PDF has no pages".to_string()))?;

    let content = asset
        .get_page_content(first_page_id)
        .map_err(|e| Error::WatermarkAsset(format!("failed to read page content: {e}")))?;

    let resources = resolve_resources(&asset, first_page_id)?;

    // Copy the asset's objects (fonts, images, graphics states) so the
    // resource references stay valid inside the bundle
    doc.max_id = asset.max_id;
    for (object_id, object) in asset.objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                doc.objects.insert(object_id, object);
            }
        }
    }

    let mut wrapped = Vec::with_capacity(content.len() + 4);
    wrapped.extend_from_slice(b"q\n");
    wrapped.extend_from_slice(&content);
    wrapped.extend_from_slice(b"\nQ\n");

    Ok(PreparedLayer {
        content: wrapped,
        resources,
    })
}

// =============================================================================
// Watermark Pass
// =============================================================================

/// Merge the watermark beneath every page of `doc`.
///
/// Page dimensions are untouched; the template is painted at its own
/// coordinates, the page keeps its own MediaBox.
pub fn apply_watermark(
    doc: &mut Document,
    layer: &WatermarkLayer,
    metrics: FontMetrics,
) -> Result<()> {
    let prepared = layer.prepare(doc, metrics)?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        // Fresh stream per page: the template itself is never attached
        let stream_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            prepared.content.clone(),
        )));
        prepend_content(doc, page_id, stream_id)?;
        merge_resources(doc, page_id, &prepared.resources)?;
    }

    Ok(())
}

// =============================================================================
// Numbering Pass
// =============================================================================

/// Stamp sequential page numbers over every page of `doc`.
///
/// Page `i` (0-based) displays `start_page + i`, horizontally centered on
/// that page's own MediaBox at a fixed offset from its bottom edge; pages
/// of different sizes each get a correctly placed stamp.
pub fn apply_page_numbers(
    doc: &mut Document,
    start_page: u32,
    metrics: FontMetrics,
) -> Result<()> {
    if start_page == 0 {
        return Err(Error::InvalidStartPage(0));
    }

    let font_id = doc.add_object(helvetica_font_dict());
    let resources = Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([(
            PAGE_NUMBER_FONT,
            Object::Reference(font_id),
        )])),
    )]);

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for (index, page_id) in page_ids.into_iter().enumerate() {
        let number = start_page
            + u32::try_from(index)
                .map_err(|_| Error::Lopdf("page index overflow".to_string()))?;
        let label = number.to_string();

        let media_box = get_media_box(doc, page_id)?;
        let label_width = metrics.string_width(&label, PAGE_NUMBER_SIZE)?;
        let x = media_box[0] + (media_box[2] - media_box[0]) / 2.0 - label_width / 2.0;
        let y = media_box[1] + PAGE_NUMBER_BOTTOM_OFFSET;

        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![PAGE_NUMBER_FONT.into(), PAGE_NUMBER_SIZE.into()],
            ),
            Operation::new("Td", vec![x.into(), y.into()]),
            show_text_op(&label, metrics)?,
            Operation::new("ET", vec![]),
        ];

        // Sandwich the existing content in q/Q so a dangling graphics
        // state (unbalanced transform, font, color) cannot skew the stamp
        let mut stamp = Vec::new();
        stamp.extend_from_slice(b"Q\n");
        stamp.extend_from_slice(&encode_ops(ops)?);

        let push_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            b"q\n".to_vec(),
        )));
        let stamp_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), stamp)));

        prepend_content(doc, page_id, push_id)?;
        append_content(doc, page_id, stamp_id)?;
        merge_resources(doc, page_id, &resources)?;
    }

    Ok(())
}

// =============================================================================
// Page plumbing
// =============================================================================

/// Insert a content stream reference at the front of a page's Contents.
fn prepend_content(doc: &mut Document, page_id: ObjectId, stream_id: ObjectId) -> Result<()> {
    edit_contents(doc, page_id, |contents| contents.insert(0, Object::Reference(stream_id)))
}

/// Insert a content stream reference at the back of a page's Contents.
fn append_content(doc: &mut Document, page_id: ObjectId, stream_id: ObjectId) -> Result<()> {
    edit_contents(doc, page_id, |contents| contents.push(Object::Reference(stream_id)))
}

fn edit_contents(
    doc: &mut Document,
    page_id: ObjectId,
    edit: impl FnOnce(&mut Vec<Object>),
) -> Result<()> {
    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("failed to get page: {e}")))?;

    let Object::Dictionary(dict) = page else {
        return Err(Error::Lopdf("page object is not a dictionary".to_string()));
    };

    let mut contents = match dict.get(b"Contents").ok().cloned() {
        Some(Object::Reference(existing_id)) => vec![Object::Reference(existing_id)],
        Some(Object::Array(arr)) => arr,
        _ => Vec::new(),
    };
    edit(&mut contents);
    dict.set("Contents", Object::Array(contents));

    Ok(())
}

/// Merge `extra` resource entries into a page's Resources dictionary.
///
/// Dictionary-valued entries (Font, ExtGState, XObject, ...) are merged
/// key-by-key; other entries are only set when absent. The merged
/// dictionary is written back inline on the page.
fn merge_resources(doc: &mut Document, page_id: ObjectId, extra: &Dictionary) -> Result<()> {
    let mut resources = resolve_resources(doc, page_id)?;

    for (key, value) in extra.iter() {
        match value {
            Object::Dictionary(extra_sub) => {
                let mut sub = match resources.get(key) {
                    Ok(Object::Dictionary(d)) => d.clone(),
                    Ok(Object::Reference(ref_id)) => match doc.get_object(*ref_id) {
                        Ok(Object::Dictionary(d)) => d.clone(),
                        _ => Dictionary::new(),
                    },
                    _ => Dictionary::new(),
                };
                for (sub_key, sub_value) in extra_sub.iter() {
                    sub.set(sub_key.clone(), sub_value.clone());
                }
                resources.set(key.clone(), Object::Dictionary(sub));
            }
            other => {
                if resources.get(key).is_err() {
                    resources.set(key.clone(), other.clone());
                }
            }
        }
    }

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("failed to get page: {e}")))?;
    if let Object::Dictionary(page_dict) = page {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(())
}

/// Resolve a page's Resources dictionary, following an indirect reference
/// or walking up to an ancestor Pages node; missing resources resolve to an
/// empty dictionary.
fn resolve_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let page = doc
        .get_object(page_id)
        .map_err(|e| Error::Lopdf(format!("failed to get page: {e}")))?;

    let Object::Dictionary(page_dict) = page else {
        return Ok(Dictionary::new());
    };

    if let Ok(res_obj) = page_dict.get(b"Resources")
        && let Some(dict) = resolve_dict_object(doc, res_obj)
    {
        return Ok(dict);
    }

    if let Ok(parent_obj) = page_dict.get(b"Parent")
        && let Some(dict) = resolve_inherited_resources(doc, parent_obj, 10)
    {
        return Ok(dict);
    }

    Ok(Dictionary::new())
}

fn resolve_dict_object(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(ref_id) => match doc.get_object(*ref_id) {
            Ok(Object::Dictionary(d)) => Some(d.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Walk up the Pages tree to find inherited Resources.
///
/// Depth-limited to survive malformed PDFs with circular Parent references.
fn resolve_inherited_resources(
    doc: &Document,
    parent_obj: &Object,
    depth: usize,
) -> Option<Dictionary> {
    if depth == 0 {
        return None;
    }

    let Object::Reference(parent_id) = parent_obj else {
        return None;
    };
    let Ok(Object::Dictionary(parent)) = doc.get_object(*parent_id) else {
        return None;
    };

    if let Ok(res_obj) = parent.get(b"Resources")
        && let Some(dict) = resolve_dict_object(doc, res_obj)
    {
        return Some(dict);
    }

    if let Ok(grandparent_obj) = parent.get(b"Parent") {
        return resolve_inherited_resources(doc, grandparent_obj, depth - 1);
    }

    None
}

/// Read a page's MediaBox, inheriting from ancestors, defaulting to A4.
fn get_media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    fn lookup(doc: &Document, dict: &Dictionary, depth: usize) -> Option<[f32; 4]> {
        if let Ok(Object::Array(arr)) = dict.get(b"MediaBox")
            && arr.len() == 4
        {
            let values: Vec<f32> = arr
                .iter()
                .filter_map(|o| match o {
                    #[allow(clippy::cast_precision_loss)]
                    Object::Integer(i) => Some(*i as f32),
                    Object::Real(r) => Some(*r),
                    _ => None,
                })
                .collect();
            if values.len() == 4 {
                return Some([values[0], values[1], values[2], values[3]]);
            }
        }

        if depth > 0
            && let Ok(Object::Reference(parent_id)) = dict.get(b"Parent")
            && let Ok(Object::Dictionary(parent)) = doc.get_object(*parent_id)
        {
            return lookup(doc, parent, depth - 1);
        }

        None
    }

    let page = doc
        .get_object(page_id)
        .map_err(|e| Error::Lopdf(format!("failed to get page: {e}")))?;

    if let Object::Dictionary(dict) = page
        && let Some(media_box) = lookup(doc, dict, 10)
    {
        return Ok(media_box);
    }

    Ok([0.0, 0.0, A4_WIDTH, A4_HEIGHT])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::font::FontMetrics;
    use crate::pdf::page::PageBuilder;

    fn doc_with_pages(count: usize) -> Document {
        let parts = (0..count)
            .map(|i| {
                let mut page = PageBuilder::a4(FontMetrics::new());
                page.text(&format!("side {i}"), 100.0, 700.0, 12.0).unwrap();
                crate::pdf::compose::Part::new(format!("p{i}"), page.build().unwrap())
            })
            .collect();
        crate::pdf::compose::concatenate(parts).unwrap()
    }

    fn media_boxes(doc: &Document) -> Vec<[f32; 4]> {
        doc.get_pages()
            .into_values()
            .map(|id| get_media_box(doc, id).unwrap())
            .collect()
    }

    #[test]
    fn test_watermark_preserves_page_count_and_size() {
        let mut doc = doc_with_pages(3);
        let before = media_boxes(&doc);

        let layer = WatermarkLayer::generated("UDKAST");
        apply_watermark(&mut doc, &layer, FontMetrics::new()).unwrap();

        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(media_boxes(&doc), before);
    }

    #[test]
    fn test_watermark_prepends_content() {
        let mut doc = doc_with_pages(1);
        let layer = WatermarkLayer::generated("UDKAST");
        apply_watermark(&mut doc, &layer, FontMetrics::new()).unwrap();

        let page_id = *doc.get_pages().values().next().unwrap();
        let Object::Dictionary(dict) = doc.get_object(page_id).unwrap() else {
            panic!("page is not a dictionary");
        };
        let Object::Array(contents) = dict.get(b"Contents").unwrap() else {
            panic!("Contents should be an array after stamping");
        };
        // Watermark stream first, original content after
        assert_eq!(contents.len(), 2);
    }

    #[test]
    fn test_each_page_gets_its_own_watermark_stream() {
        let mut doc = doc_with_pages(3);
        let layer = WatermarkLayer::generated("UDKAST");
        apply_watermark(&mut doc, &layer, FontMetrics::new()).unwrap();

        let mut first_streams = Vec::new();
        for page_id in doc.get_pages().into_values() {
            let Object::Dictionary(dict) = doc.get_object(page_id).unwrap() else {
                panic!("page is not a dictionary");
            };
            let Object::Array(contents) = dict.get(b"Contents").unwrap() else {
                panic!("Contents should be an array");
            };
            let Object::Reference(id) = contents[0] else {
                panic!("first content entry should be a reference");
            };
            first_streams.push(id);
        }
        // Distinct objects: the template was cloned, not shared
        first_streams.sort_unstable();
        first_streams.dedup();
        assert_eq!(first_streams.len(), 3);
    }

    #[test]
    fn test_page_numbers_stamp_every_page() {
        let mut doc = doc_with_pages(4);
        apply_page_numbers(&mut doc, 2, FontMetrics::new()).unwrap();

        assert_eq!(doc.get_pages().len(), 4);
        for (i, page_id) in doc.get_pages().into_values().enumerate() {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let expected = format!("({})", 2 + i);
            assert!(
                text.contains(&expected),
                "page {i} should carry number {}",
                2 + i
            );
        }
    }

    #[test]
    fn test_mixed_page_sizes_keep_their_own_stamp_position() {
        let metrics = FontMetrics::new();
        let mut a4 = PageBuilder::a4(metrics);
        a4.text("hojformat", 100.0, 700.0, 12.0).unwrap();
        let mut letter = PageBuilder::new(612.0, 792.0, metrics);
        letter.text("brevformat", 100.0, 650.0, 12.0).unwrap();
        let parts = vec![
            crate::pdf::compose::Part::new("a4", a4.build().unwrap()),
            crate::pdf::compose::Part::new("letter", letter.build().unwrap()),
        ];
        let mut doc = crate::pdf::compose::concatenate(parts).unwrap();

        let layer = WatermarkLayer::generated("UDKAST");
        apply_watermark(&mut doc, &layer, metrics).unwrap();
        apply_page_numbers(&mut doc, 2, metrics).unwrap();

        let widths = [crate::pdf::page::A4_WIDTH, 612.0];
        for (i, page_id) in doc.get_pages().into_values().enumerate() {
            let media_box = get_media_box(&doc, page_id).unwrap();
            assert!(
                (media_box[2] - media_box[0] - widths[i]).abs() < 0.1,
                "page {i} width changed"
            );

            let content = doc.get_page_content(page_id).unwrap();
            let ops = lopdf::content::Content::decode(&content).unwrap().operations;
            // The numbering stamp is appended last, so the final Td is its
            // position
            let td = ops.iter().rev().find(|op| op.operator == "Td").unwrap();
            let x = operand_f32(&td.operands[0]);
            let label = (2 + i).to_string();
            let expected =
                widths[i] / 2.0 - metrics.string_width(&label, PAGE_NUMBER_SIZE).unwrap() / 2.0;
            assert!(
                (x - expected).abs() < 0.5,
                "page {i} stamp not centered for its own width"
            );
        }
    }

    fn operand_f32(obj: &Object) -> f32 {
        match obj {
            Object::Real(r) => *r,
            #[allow(clippy::cast_precision_loss)]
            Object::Integer(i) => *i as f32,
            _ => panic!("numeric operand expected"),
        }
    }

    #[test]
    fn test_page_numbers_reject_zero_start() {
        let mut doc = doc_with_pages(1);
        let result = apply_page_numbers(&mut doc, 0, FontMetrics::new());
        assert!(matches!(result, Err(Error::InvalidStartPage(0))));
    }

    #[test]
    fn test_asset_watermark_requires_valid_pdf() {
        assert!(WatermarkLayer::from_asset_bytes(vec![0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_asset_watermark_from_generated_page() {
        let mut page = PageBuilder::a4(FontMetrics::new());
        page.text("STEMPEL", 200.0, 400.0, 40.0).unwrap();
        let mut bytes = Vec::new();
        page.build().unwrap().save_to(&mut bytes).unwrap();

        let layer = WatermarkLayer::from_asset_bytes(bytes).unwrap();
        let mut doc = doc_with_pages(2);
        apply_watermark(&mut doc, &layer, FontMetrics::new()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
