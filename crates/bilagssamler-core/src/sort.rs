//! Filename-derived ordering for appendix uploads.
//!
//! Appendix files are conventionally named `Bilag<number><letters>(.<part>)*`
//! ("Bilag 3", "bilag12a", "Bilag 4.2.1", ...). Uploads arrive in arbitrary
//! order, so the batch is sorted by the composite key extracted from that
//! pattern before the pipeline assigns titles and page ranges.

use std::sync::LazyLock;

use regex::Regex;

/// Anchored on the filename stem. The literal word is case-insensitive;
/// subparts are dot-delimited numbers.
static BILAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"(?i)^bilag\s*(\d+)([a-z]*)((?:\.\d+)*)$").unwrap()
});

/// Composite sort key for an appendix filename.
///
/// `Matched` keys order numerically by number, then by lowercased letter
/// suffix, then component-wise by subparts. Filenames that do not match the
/// pattern sort last and are mutually equal, so a stable sort keeps their
/// relative upload order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BilagKey {
    Matched {
        number: u64,
        letters: String,
        subparts: Vec<u64>,
    },
    Unmatched,
}

/// Extract the sort key from a filename.
///
/// A trailing `.pdf` extension is ignored; everything else must match the
/// bilag pattern in full.
pub fn sort_key(filename: &str) -> BilagKey {
    let stem = strip_pdf_extension(filename);

    let Some(caps) = BILAG_PATTERN.captures(stem) else {
        return BilagKey::Unmatched;
    };

    // A number longer than u64 is not a realistic appendix index
    let Ok(number) = caps[1].parse::<u64>() else {
        return BilagKey::Unmatched;
    };

    let letters = caps[2].to_lowercase();

    let mut subparts = Vec::new();
    for part in caps[3].split('.').filter(|p| !p.is_empty()) {
        match part.parse::<u64>() {
            Ok(n) => subparts.push(n),
            Err(_) => return BilagKey::Unmatched,
        }
    }

    BilagKey::Matched {
        number,
        letters,
        subparts,
    }
}

/// Sort a batch of named items in place by the bilag key of their names.
///
/// The sort is stable, so non-matching filenames retain their upload order
/// at the end of the batch.
pub fn sort_by_bilag_key<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| sort_key(name(a)).cmp(&sort_key(name(b))));
}

/// Strip a trailing `.pdf` extension, case-insensitively.
///
/// Also used to derive divider and table-of-contents titles from uploaded
/// filenames.
pub fn strip_pdf_extension(filename: &str) -> &str {
    // get() instead of slicing: the offset may land inside a multi-byte
    // character when there is no ASCII extension
    let suffix = filename
        .len()
        .checked_sub(4)
        .and_then(|start| filename.get(start..));
    match suffix {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &filename[..filename.len() - 4],
        _ => filename,
    }
}
