//! Askama templates for the upload flow.
//!
//! The upload form posts via HTMX when available and degrades to a plain
//! form submission; both paths end on the download page.
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with inline CSS
//! - `index.html` - Landing page with the multi-file upload form
//! - `done.html` - Download page for a finished bundle

use askama::Template;
use askama_web::WebTemplate;

/// Landing page with the upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Pre-filled starting page number.
    pub start_page: u32,
    /// Pre-filled watermark text.
    pub watermark_text: String,
    /// Error from a failed assembly attempt, shown above the form.
    pub error: Option<String>,
}

impl IndexTemplate {
    pub const fn new(start_page: u32, watermark_text: String) -> Self {
        Self {
            start_page,
            watermark_text,
            error: None,
        }
    }

    pub fn with_error(start_page: u32, watermark_text: String, error: String) -> Self {
        Self {
            start_page,
            watermark_text,
            error: Some(error),
        }
    }
}

/// Download page for a finished bundle.
#[derive(Template, WebTemplate)]
#[template(path = "done.html")]
pub struct DoneTemplate {
    pub session_id: String,
    pub filename: String,
    pub page_count: usize,
}
