//! Page-range planning: the two-pass computation of where every appendix
//! lands in the finished bundle.
//!
//! The table of contents sits at the front of the bundle, so every
//! appendix's final page number depends on how many pages the ToC itself
//! occupies, which depends on the entries it lists but not on the number
//! values in them (see `pdf::toc`). The plan therefore renders the ToC once
//! with zeroed ranges purely to count its pages, computes the real ranges
//! from that count, and renders again with the final values. The two passes
//! must agree on page count; disagreement is surfaced as an error, never
//! silently patched.

use lopdf::Document;
use tracing::debug;

use crate::error::{Error, Result};

use super::font::FontMetrics;
use super::toc::{TocEntry, render_toc};

/// Title and content page count of one appendix, in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendixInfo {
    pub title: String,
    /// Content pages, excluding the divider this tool inserts. Never zero.
    pub page_count: usize,
}

/// The inclusive span of final page numbers an appendix occupies.
///
/// `start` is the divider page's number; `end` is the last content page's.
/// A one-page appendix therefore spans `(start, start + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

/// Result of range planning: the final ToC document and every range.
pub struct TocPlan {
    /// The table of contents rendered with final ranges.
    pub toc: Document,
    /// How many pages the ToC occupies.
    pub toc_pages: usize,
    /// One range per appendix, in input order. Display-only; the
    /// compositor derives nothing from these.
    pub ranges: Vec<PageRange>,
}

/// Compute final page ranges for `appendices` and render the table of
/// contents listing them.
///
/// `start_page` is the number printed on the very first output page (the
/// first ToC page). Each appendix contributes one divider page plus its
/// `page_count` content pages: with the divider at `current`, its range is
/// `[current, current + page_count]` and the next appendix starts at
/// `current + page_count + 1`, so consecutive ranges are contiguous with no
/// gaps or overlaps.
pub fn plan_ranges(
    appendices: &[AppendixInfo],
    start_page: u32,
    metrics: FontMetrics,
) -> Result<TocPlan> {
    if start_page == 0 {
        return Err(Error::InvalidStartPage(0));
    }

    for info in appendices {
        if info.page_count == 0 {
            return Err(Error::EmptyAppendix {
                name: info.title.clone(),
            });
        }
    }

    // Pass 1: placeholder ranges, only to measure the ToC's own length.
    let placeholder: Vec<TocEntry> = appendices
        .iter()
        .enumerate()
        .map(|(i, info)| TocEntry {
            ordinal: i + 1,
            title: info.title.clone(),
            start_page: 0,
            end_page: 0,
        })
        .collect();
    let toc_pages = render_toc(&placeholder, metrics)?.get_pages().len();
    debug!("Table of contents occupies {} page(s)", toc_pages);

    // Pass 2: real ranges, offset past the ToC.
    let toc_pages_u32 = u32::try_from(toc_pages)
        .map_err(|_| Error::Lopdf("table of contents page count overflow".to_string()))?;
    let mut current = start_page + toc_pages_u32;

    let mut ranges = Vec::with_capacity(appendices.len());
    let mut entries = Vec::with_capacity(appendices.len());
    for (i, info) in appendices.iter().enumerate() {
        let span = u32::try_from(info.page_count).map_err(|_| Error::Lopdf(format!(
            "page count overflow in appendix '{}'",
            info.title
        )))?;

        let range = PageRange {
            start: current,
            end: current + span,
        };
        ranges.push(range);
        entries.push(TocEntry {
            ordinal: i + 1,
            title: info.title.clone(),
            start_page: range.start,
            end_page: range.end,
        });

        current += span + 1;
    }

    let toc = render_toc(&entries, metrics)?;

    // Digit widths cannot move a line break in this layout, so the two
    // passes agree. Assert it rather than trust it.
    let rendered = toc.get_pages().len();
    if rendered != toc_pages {
        return Err(Error::TocPagination {
            measured: toc_pages,
            rendered,
        });
    }

    Ok(TocPlan {
        toc,
        toc_pages,
        ranges,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(title: &str, page_count: usize) -> AppendixInfo {
        AppendixInfo {
            title: title.to_string(),
            page_count,
        }
    }

    #[test]
    fn test_single_appendix_spec_scenario() {
        // 1 appendix with 3 content pages, start page 2, one ToC page:
        // divider on page 3, content on 4-6
        let plan = plan_ranges(&[info("Bilag 1", 3)], 2, FontMetrics::new()).unwrap();
        assert_eq!(plan.toc_pages, 1);
        assert_eq!(plan.ranges, vec![PageRange { start: 3, end: 6 }]);
    }

    #[test]
    fn test_ranges_are_contiguous() {
        let appendices = vec![
            info("Bilag 1", 3),
            info("Bilag 2", 1),
            info("Bilag 3", 7),
            info("Bilag 4", 2),
        ];
        let plan = plan_ranges(&appendices, 2, FontMetrics::new()).unwrap();

        for window in plan.ranges.windows(2) {
            assert_eq!(window[0].end + 1, window[1].start, "gap or overlap between ranges");
        }
        for (range, appendix) in plan.ranges.iter().zip(&appendices) {
            assert_eq!(
                (range.end - range.start) as usize,
                appendix.page_count,
                "range span must equal the content page count"
            );
        }
    }

    #[test]
    fn test_first_range_follows_toc_span() {
        let plan = plan_ranges(&[info("Bilag 1", 2)], 5, FontMetrics::new()).unwrap();
        assert_eq!(plan.ranges[0].start, 5 + plan.toc_pages as u32);
    }

    #[test]
    fn test_one_page_appendix_spans_two_numbers() {
        // Divider + a single content page: start and end still differ
        let plan = plan_ranges(&[info("Bilag 1", 1)], 2, FontMetrics::new()).unwrap();
        assert_eq!(plan.ranges[0].end, plan.ranges[0].start + 1);
    }

    #[test]
    fn test_duplicate_titles_get_distinct_ranges() {
        let appendices = vec![info("Bilag 1", 2), info("Bilag 1", 5)];
        let plan = plan_ranges(&appendices, 2, FontMetrics::new()).unwrap();
        assert_ne!(plan.ranges[0], plan.ranges[1]);
        assert_eq!(plan.ranges[0].end + 1, plan.ranges[1].start);
    }

    #[test]
    fn test_zero_page_appendix_rejected() {
        let result = plan_ranges(&[info("Bilag 1", 0)], 2, FontMetrics::new());
        assert!(matches!(result, Err(Error::EmptyAppendix { .. })));
    }

    #[test]
    fn test_zero_start_page_rejected() {
        let result = plan_ranges(&[info("Bilag 1", 1)], 0, FontMetrics::new());
        assert!(matches!(result, Err(Error::InvalidStartPage(0))));
    }

    #[test]
    fn test_multi_page_toc_shifts_ranges() {
        let appendices: Vec<AppendixInfo> = (1..=80)
            .map(|i| info(&format!("Bilag {i} med forholdsvis lang titel til listen"), 1))
            .collect();
        let plan = plan_ranges(&appendices, 2, FontMetrics::new()).unwrap();
        assert!(plan.toc_pages > 1);
        assert_eq!(plan.ranges[0].start, 2 + plan.toc_pages as u32);
    }
}
