//! Single-page canvas construction for generated pages.
//!
//! Divider pages, table-of-contents pages and decoration stamps are all
//! built the same way: a list of content-stream operations on a page-sized
//! canvas, finalized into a standalone one-page `lopdf::Document` (or, for
//! stamps, into raw content bytes merged onto existing pages).
//!
//! PDF uses a bottom-left origin: (0, 0) is the bottom-left corner of the
//! page and Y increases upward. All coordinates in this module follow that
//! convention.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::{Error, Result};

use super::font::FontMetrics;
use super::layout::wrap_text;

/// A4 portrait in PDF points.
pub const A4_WIDTH: f32 = 595.0;
pub const A4_HEIGHT: f32 = 842.0;

/// Resource name of the Helvetica font on generated pages.
pub(crate) const FONT_NAME: &str = "F1";

/// Divider title font size in points.
const DIVIDER_FONT_SIZE: f32 = 24.0;

/// Leading between wrapped divider title lines.
const DIVIDER_LINE_HEIGHT: f32 = 30.0;

/// Horizontal page margin for divider titles.
const DIVIDER_MARGIN: f32 = 72.0;

/// The Standard-14 Helvetica font dictionary with WinAnsiEncoding.
///
/// No font program is embedded; every conforming reader ships these metrics.
pub(crate) fn helvetica_font_dict() -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

/// Encode content-stream operations into stream bytes.
pub(crate) fn encode_ops(operations: Vec<Operation>) -> Result<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|e| Error::Lopdf(format!("Failed to encode content stream: {e}")))
}

/// A `Tj` operation showing `text` in WinAnsi encoding.
pub(crate) fn show_text_op(text: &str, metrics: FontMetrics) -> Result<Operation> {
    let bytes = metrics.encode_text(text)?;
    Ok(Operation::new(
        "Tj",
        vec![Object::String(bytes, lopdf::StringFormat::Literal)],
    ))
}

/// Accumulates drawing operations for one generated page.
pub struct PageBuilder {
    width: f32,
    height: f32,
    metrics: FontMetrics,
    operations: Vec<Operation>,
}

impl PageBuilder {
    pub fn new(width: f32, height: f32, metrics: FontMetrics) -> Self {
        Self {
            width,
            height,
            metrics,
            operations: Vec::new(),
        }
    }

    pub fn a4(metrics: FontMetrics) -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT, metrics)
    }

    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Draw `text` with its left edge at `x`, baseline at `y`.
    pub fn text(&mut self, text: &str, x: f32, y: f32, font_size: f32) -> Result<()> {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![FONT_NAME.into(), font_size.into()],
        ));
        self.operations
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(show_text_op(text, self.metrics)?);
        self.operations.push(Operation::new("ET", vec![]));
        Ok(())
    }

    /// Draw `text` horizontally centered on `center_x`, baseline at `y`.
    ///
    /// Fails if the text cannot be measured.
    pub fn text_centered(&mut self, text: &str, center_x: f32, y: f32, font_size: f32) -> Result<()> {
        let width = self.metrics.string_width(text, font_size)?;
        self.text(text, center_x - width / 2.0, y, font_size)
    }

    /// Finalize into a standalone one-page document.
    pub fn build(self) -> Result<Document> {
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

        let content = encode_ops(self.operations)?;
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
                    self.width.into(),
                    self.height.into(),
                ]),
            ),
        ]));

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(doc)
    }
}

/// Render a divider page: the appendix title, wrapped and centered.
pub fn render_divider(title: &str, metrics: FontMetrics) -> Result<Document> {
    let mut page = PageBuilder::a4(metrics);

    let max_width = page.width() - 2.0 * DIVIDER_MARGIN;
    let lines = wrap_text(title, DIVIDER_FONT_SIZE, max_width, metrics)?;

    // Center the title block around the upper third of the page
    #[allow(clippy::cast_precision_loss)]
    let block_height = lines.len() as f32 * DIVIDER_LINE_HEIGHT;
    let mut y = A4_HEIGHT * 2.0 / 3.0 + block_height / 2.0;

    for line in &lines {
        page.text_centered(line, A4_WIDTH / 2.0, y, DIVIDER_FONT_SIZE)?;
        y -= DIVIDER_LINE_HEIGHT;
    }

    page.build()
}
