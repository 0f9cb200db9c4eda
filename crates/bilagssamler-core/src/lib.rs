//! Bilagssamler Core Library
//!
//! This library assembles a batch of appendix PDFs ("bilag") into a single
//! paginated bundle:
//! - Filename-based ordering of the uploaded batch
//! - A table of contents with computed page ranges
//! - A divider page in front of every appendix
//! - Watermarking beneath the content and sequential page numbers on top

pub mod config;
pub mod error;
pub mod pdf;
pub mod sort;

pub use config::{AssemblyConfig, config_dir};
pub use error::{Error, Result};
pub use pdf::{
    AppendixInfo, FontMetrics, PageRange, Part, TocEntry, TocPlan, WatermarkLayer,
};
pub use sort::{BilagKey, sort_by_bilag_key, sort_key, strip_pdf_extension};

use std::fs;

use lopdf::Document;
use tracing::{debug, info};

/// One uploaded appendix: the original filename and the raw PDF bytes.
pub struct AppendixInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl AppendixInput {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// High-level bundle assembler combining all pipeline stages.
pub struct Assembler {
    config: AssemblyConfig,
    metrics: FontMetrics,
}

impl Assembler {
    /// Create an assembler with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration fails validation.
    pub fn new(config: AssemblyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: FontMetrics::new(),
        })
    }

    pub const fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Assemble `inputs` into a single bundle PDF.
    ///
    /// The batch is sorted by filename, each appendix is opened and counted,
    /// page ranges and the table of contents are computed, parts are
    /// concatenated in order and the result is watermarked and numbered.
    /// Any failure aborts the whole run; no partial bundle is ever produced.
    pub fn assemble(&self, mut inputs: Vec<AppendixInput>) -> Result<Vec<u8>> {
        if inputs.is_empty() {
            return Err(Error::NoAppendices);
        }

        sort_by_bilag_key(&mut inputs, |input| &input.filename);

        // Open everything up front so a broken file aborts before any
        // rendering happens
        let mut appendices = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let doc = Document::load_mem(&input.bytes).map_err(|e| Error::AppendixOpen {
                name: input.filename.clone(),
                reason: e.to_string(),
            })?;
            let page_count = doc.get_pages().len();
            if page_count == 0 {
                return Err(Error::EmptyAppendix {
                    name: input.filename.clone(),
                });
            }
            let title = strip_pdf_extension(&input.filename).to_string();
            debug!("Opened {} ({} pages)", input.filename, page_count);
            appendices.push(Appendix {
                title,
                page_count,
                doc,
            });
        }

        let infos: Vec<AppendixInfo> = appendices
            .iter()
            .map(|a| AppendixInfo {
                title: a.title.clone(),
                page_count: a.page_count,
            })
            .collect();
        let plan = pdf::plan_ranges(&infos, self.config.start_page, self.metrics)?;
        info!(
            "Planned {} appendices over a {}-page table of contents",
            appendices.len(),
            plan.toc_pages
        );

        let mut parts = Vec::with_capacity(1 + appendices.len() * 2);
        parts.push(Part::new("indholdsfortegnelse", plan.toc));
        for appendix in appendices {
            let divider = pdf::render_divider(&appendix.title, self.metrics)?;
            parts.push(Part::new(format!("{} (skilleblad)", appendix.title), divider));
            parts.push(Part::new(appendix.title, appendix.doc));
        }

        let mut bundle = pdf::concatenate(parts)?;
        debug!("Concatenated bundle has {} pages", bundle.get_pages().len());

        let layer = self.watermark_layer()?;
        pdf::apply_watermark(&mut bundle, &layer, self.metrics)?;
        pdf::apply_page_numbers(&mut bundle, self.config.start_page, self.metrics)?;

        let mut bytes = Vec::new();
        bundle
            .save_to(&mut bytes)
            .map_err(|e| Error::PdfSave(e.to_string()))?;
        info!("Assembled bundle: {} bytes", bytes.len());
        Ok(bytes)
    }

    fn watermark_layer(&self) -> Result<WatermarkLayer> {
        if let Some(path) = &self.config.watermark_asset {
            let bytes = fs::read(path).map_err(|e| {
                Error::WatermarkAsset(format!("failed to read {}: {e}", path.display()))
            })?;
            WatermarkLayer::from_asset_bytes(bytes)
        } else {
            Ok(WatermarkLayer::generated(&self.config.watermark_text))
        }
    }
}

struct Appendix {
    title: String,
    page_count: usize,
    doc: Document,
}

/// Assemble a batch with default settings apart from the starting page
/// number.
///
/// # Errors
///
/// Fails when the batch is empty, an input cannot be opened, has no pages,
/// a title contains an unsupported character, or composition fails.
pub fn generate(inputs: Vec<AppendixInput>, start_page: u32) -> Result<Vec<u8>> {
    let config = AssemblyConfig {
        start_page,
        ..AssemblyConfig::default()
    };
    Assembler::new(config)?.assemble(inputs)
}
