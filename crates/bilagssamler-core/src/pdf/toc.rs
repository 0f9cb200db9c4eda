//! Table-of-contents rendering.
//!
//! Lays out numbered entries down a fixed vertical band, starting a new page
//! whenever the next entry's wrapped title no longer fits. Pagination is a
//! pure function of the entry titles and count: page-number values only move
//! text within the "Side" column and never influence a line break, which is
//! what lets the range calculator measure the ToC's own length with
//! placeholder ranges (see `pdf::ranges`).

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::{Error, Result};

use super::font::FontMetrics;
use super::layout::wrap_text;
use super::page::{A4_HEIGHT, A4_WIDTH, FONT_NAME, encode_ops, helvetica_font_dict, show_text_op};

/// One table-of-contents line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 1-based position in the bundle
    pub ordinal: usize,
    /// Appendix title (the filename stem)
    pub title: String,
    /// Final page number of the appendix's divider page
    pub start_page: u32,
    /// Final page number of the appendix's last content page
    pub end_page: u32,
}

const FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 16.0;

/// Extra vertical space between entries: 20% of one line height.
const ENTRY_GAP: f32 = LINE_HEIGHT * 0.2;

/// Baseline of the first entry on each page.
const TOP_BASELINE: f32 = A4_HEIGHT - 72.0;

/// No baseline may fall below this.
const BOTTOM_MARGIN: f32 = 72.0;

const ORDINAL_X: f32 = 72.0;
const TITLE_X: f32 = 110.0;

/// Right edge of the title column; the "Side" column starts past it.
const TITLE_RIGHT: f32 = 440.0;

/// Left edge of the literal "Side" label.
const SIDE_X: f32 = 460.0;

/// Render the table of contents for `entries`, in input order.
///
/// Returns a document of one or more A4 pages. Rendering the same entries
/// twice yields identical pagination and line breaks.
pub fn render_toc(entries: &[TocEntry], metrics: FontMetrics) -> Result<Document> {
    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut ops: Vec<Operation> = Vec::new();
    let mut baseline = TOP_BASELINE;

    for entry in entries {
        let title_width = TITLE_RIGHT - TITLE_X;
        let lines = wrap_text(&entry.title, FONT_SIZE, title_width, metrics)?;
        let line_count = lines.len().max(1);

        // The entry's last baseline must stay inside the printable band;
        // entries are never split across pages.
        #[allow(clippy::cast_precision_loss)]
        let descent = (line_count - 1) as f32 * LINE_HEIGHT;
        if baseline - descent < BOTTOM_MARGIN && baseline < TOP_BASELINE {
            pages.push(std::mem::take(&mut ops));
            baseline = TOP_BASELINE;
        }

        draw_entry(&mut ops, entry, &lines, baseline, metrics)?;

        #[allow(clippy::cast_precision_loss)]
        let entry_height = line_count as f32 * LINE_HEIGHT;
        baseline -= entry_height + ENTRY_GAP;
    }

    if !ops.is_empty() || pages.is_empty() {
        pages.push(ops);
    }

    build_document(pages)
}

/// Draw one entry: ordinal, wrapped title lines, "Side" label and the range.
fn draw_entry(
    ops: &mut Vec<Operation>,
    entry: &TocEntry,
    lines: &[String],
    baseline: f32,
    metrics: FontMetrics,
) -> Result<()> {
    text_at(ops, &format!("{}.", entry.ordinal), ORDINAL_X, baseline, metrics)?;

    let mut y = baseline;
    for line in lines {
        text_at(ops, line, TITLE_X, y, metrics)?;
        y -= LINE_HEIGHT;
    }

    text_at(ops, "Side", SIDE_X, baseline, metrics)?;

    let start_text = entry.start_page.to_string();
    let number_x = SIDE_X + metrics.string_width("Side ", FONT_SIZE)?;
    text_at(ops, &start_text, number_x, baseline, metrics)?;

    if entry.end_page != entry.start_page {
        let start_width = metrics.string_width(&start_text, FONT_SIZE)?;
        text_at(
            ops,
            &format!(" - {}", entry.end_page),
            number_x + start_width,
            baseline,
            metrics,
        )?;
    }

    Ok(())
}

fn text_at(
    ops: &mut Vec<Operation>,
    text: &str,
    x: f32,
    y: f32,
    metrics: FontMetrics,
) -> Result<()> {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![FONT_NAME.into(), FONT_SIZE.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(show_text_op(text, metrics)?);
    ops.push(Operation::new("ET", vec![]));
    Ok(())
}

/// Assemble per-page operation lists into one A4 document sharing a single
/// font resource.
fn build_document(pages: Vec<Vec<Operation>>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(helvetica_font_dict());
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([(
            FONT_NAME,
            Object::Reference(font_id),
        )])),
    )]));

    let mut kids = Vec::with_capacity(pages.len());
    for ops in pages {
        let content = encode_ops(ops)?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    0.into(),
                    0.into(),
                    A4_WIDTH.into(),
                    A4_HEIGHT.into(),
                ]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len())
        .map_err(|_| Error::Lopdf("page count overflow".to_string()))?;
    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}
