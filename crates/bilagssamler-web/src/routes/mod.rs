//! HTTP route handlers for the bilagssamler web application.
//!
//! HTML routes use Askama templates from the `templates` module; the
//! download route returns the raw bundle.

mod assemble;
mod download;
mod pages;

pub use assemble::assemble_bundle;
pub use download::download_bundle;
pub use pages::{done, index};
