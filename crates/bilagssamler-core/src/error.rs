use thiserror::Error;

/// Unified error type for bilagssamler-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Input errors (no appendices, unreadable source PDFs, bad assets)
/// - Layout errors (text measurement failures)
/// - Composition errors (concatenation, decoration, saving)
/// - Configuration errors (loading, validation)
/// - General I/O operations
///
/// There is no partial-success mode: the pipeline either produces one
/// complete, fully decorated bundle or surfaces one of these.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// No appendix files were supplied
    #[error("no appendix files supplied")]
    NoAppendices,

    /// Failed to open or parse an appendix PDF
    #[error("failed to open appendix '{name}': {reason}")]
    AppendixOpen { name: String, reason: String },

    /// An appendix PDF contains no pages
    #[error("appendix '{name}' contains no pages")]
    EmptyAppendix { name: String },

    /// The configured watermark asset could not be used
    #[error("failed to load watermark asset: {0}")]
    WatermarkAsset(String),

    /// The starting page number is not a positive integer
    #[error("invalid starting page number {0} (must be >= 1)")]
    InvalidStartPage(u32),

    // ==========================================================================
    // Layout Errors
    // ==========================================================================
    /// A character has no metrics in the built-in Helvetica tables
    #[error("cannot measure character {ch:?} (U+{codepoint:04X}): not in the supported repertoire")]
    UnsupportedChar { ch: char, codepoint: u32 },

    /// The two table-of-contents rendering passes disagreed on page count
    #[error("table of contents pagination changed between passes: measured {measured} pages, rendered {rendered}")]
    TocPagination { measured: usize, rendered: usize },

    // ==========================================================================
    // Composition Errors
    // ==========================================================================
    /// Failed to concatenate a part into the bundle
    #[error("failed to compose '{part}': {reason}")]
    Compose { part: String, reason: String },

    /// Failed to save the assembled PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
