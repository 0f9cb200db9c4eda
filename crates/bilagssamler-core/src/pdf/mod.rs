//! PDF production: page building, table of contents, composition and
//! decoration.

pub mod compose;
pub mod decorate;
pub mod font;
pub mod layout;
pub mod page;
pub mod ranges;
pub mod toc;

pub use compose::{Part, concatenate};
pub use decorate::{WatermarkLayer, apply_page_numbers, apply_watermark};
pub use font::FontMetrics;
pub use layout::wrap_text;
pub use page::{PageBuilder, render_divider};
pub use ranges::{AppendixInfo, PageRange, TocPlan, plan_ranges};
pub use toc::TocEntry;
