//! Greedy word-wrap against measured text widths.

use crate::error::Result;

use super::font::FontMetrics;

/// Wrap `text` into lines no wider than `max_width` points at `font_size`.
///
/// Iterates whitespace-separated tokens, appending each to the current line
/// while the measured width of `line + " " + token` stays within
/// `max_width`. A token that alone exceeds `max_width` still gets its own
/// line; tokens are never split. Empty input yields no lines.
///
/// Fails if any character cannot be measured (see `FontMetrics`).
pub fn wrap_text(
    text: &str,
    font_size: f32,
    max_width: f32,
    metrics: FontMetrics,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for token in text.split_whitespace() {
        if current.is_empty() {
            current = token.to_string();
            continue;
        }

        let candidate = format!("{current} {token}");
        if metrics.string_width(&candidate, font_size)? <= max_width {
            current = candidate;
        } else {
            lines.push(current);
            current = token.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const METRICS: FontMetrics = FontMetrics::new();

    #[test]
    fn test_empty_input_yields_no_lines() {
        assert!(wrap_text("", 12.0, 200.0, METRICS).unwrap().is_empty());
        assert!(wrap_text("   ", 12.0, 200.0, METRICS).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let lines = wrap_text("Bilag 1", 12.0, 200.0, METRICS).unwrap();
        assert_eq!(lines, vec!["Bilag 1"]);
    }

    #[test]
    fn test_no_line_exceeds_max_width() {
        let text = "Erklæring om ejerforhold og tegningsret for selskabet";
        let max_width = 120.0;
        let lines = wrap_text(text, 12.0, max_width, METRICS).unwrap();
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(
                METRICS.string_width(line, 12.0).unwrap() <= max_width,
                "line '{line}' exceeds max width"
            );
        }
        // Order and content preserved
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_oversized_token_gets_own_line() {
        let text = "kort Generalforsamlingsbeslutningsreferat kort";
        let lines = wrap_text(text, 12.0, 60.0, METRICS).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Generalforsamlingsbeslutningsreferat");
        // The unsplittable token is the only line allowed to overflow
        assert!(METRICS.string_width(&lines[0], 12.0).unwrap() <= 60.0);
        assert!(METRICS.string_width(&lines[2], 12.0).unwrap() <= 60.0);
    }

    #[test]
    fn test_wrap_is_deterministic() {
        let text = "Bilag 7 vedrørende overdragelse af anparter i selskabet";
        let a = wrap_text(text, 12.0, 150.0, METRICS).unwrap();
        let b = wrap_text(text, 12.0, 150.0, METRICS).unwrap();
        assert_eq!(a, b);
    }
}
