//! End-to-end assembly tests running the whole pipeline on generated
//! fixture PDFs.

#![allow(clippy::unwrap_used)]

use bilagssamler_core::pdf::{PageBuilder, Part, concatenate};
use bilagssamler_core::{AppendixInput, AssemblyConfig, Assembler, Error, FontMetrics, generate};
use lopdf::Document;

/// A fixture appendix: `pages` A4 pages, each carrying a marker string.
fn appendix_pdf(pages: usize, marker: &str) -> Vec<u8> {
    let metrics = FontMetrics::new();
    let parts = (0..pages)
        .map(|i| {
            let mut page = PageBuilder::a4(metrics);
            page.text(&format!("{marker} {i}"), 100.0, 700.0, 12.0).unwrap();
            Part::new(format!("{marker}-{i}"), page.build().unwrap())
        })
        .collect();
    let mut doc = concatenate(parts).unwrap();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Decoded content of every page, in page order.
fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

#[test]
fn test_empty_batch_is_rejected() {
    let result = generate(Vec::new(), 2);
    assert!(matches!(result, Err(Error::NoAppendices)));
}

#[test]
fn test_unreadable_input_aborts_the_run() {
    let inputs = vec![
        AppendixInput::new("Bilag 1.pdf", appendix_pdf(1, "ok")),
        AppendixInput::new("Bilag 2.pdf", b"not a pdf".to_vec()),
    ];
    let result = generate(inputs, 2);
    assert!(
        matches!(result, Err(Error::AppendixOpen { ref name, .. }) if name == "Bilag 2.pdf")
    );
}

#[test]
fn test_single_appendix_bundle_layout() {
    // One 3-page appendix, numbering starts at 2: one ToC page numbered 2,
    // divider numbered 3, content numbered 4 to 6
    let inputs = vec![AppendixInput::new("Bilag 1.pdf", appendix_pdf(3, "indhold"))];
    let bundle = generate(inputs, 2).unwrap();

    let pages = page_texts(&bundle);
    assert_eq!(pages.len(), 5);

    // ToC: ordinal, title, literal label and the hyphenated range
    assert!(pages[0].contains("(1.)"));
    assert!(pages[0].contains("(Bilag 1)"));
    assert!(pages[0].contains("(Side)"));
    assert!(pages[0].contains("(3)"));
    assert!(pages[0].contains("( - 6)"));

    // Divider repeats the title
    assert!(pages[1].contains("(Bilag 1)"));

    // Sequential numbers, one per page
    for (i, page) in pages.iter().enumerate() {
        let number = format!("({})", 2 + i);
        assert!(page.contains(&number), "page {i} should be numbered {}", 2 + i);
    }
}

#[test]
fn test_total_page_count() {
    // ToC (1 page) + per appendix one divider plus its content
    let inputs = vec![
        AppendixInput::new("Bilag 1.pdf", appendix_pdf(2, "a")),
        AppendixInput::new("Bilag 2.pdf", appendix_pdf(3, "b")),
        AppendixInput::new("Bilag 3.pdf", appendix_pdf(1, "c")),
    ];
    let bundle = generate(inputs, 2).unwrap();
    assert_eq!(page_texts(&bundle).len(), 1 + 3 + 2 + 3 + 1);
}

#[test]
fn test_batch_is_sorted_by_filename() {
    // Uploaded out of order; "Bilag 2" carries marker "beta", "Bilag 10"
    // marker "gamma". Numeric order puts 2 before 10.
    let inputs = vec![
        AppendixInput::new("Bilag 10.pdf", appendix_pdf(1, "gamma")),
        AppendixInput::new("Bilag 2.pdf", appendix_pdf(1, "beta")),
    ];
    let bundle = generate(inputs, 1).unwrap();

    let pages = page_texts(&bundle);
    // Page 1 is the first divider, page 2 the first content page
    assert!(pages[1].contains("(Bilag 2)"));
    assert!(pages[2].contains("(beta 0)"));
    assert!(pages[3].contains("(Bilag 10)"));
    assert!(pages[4].contains("(gamma 0)"));
}

#[test]
fn test_one_page_appendix_gets_hyphenated_range() {
    // Divider and content page always differ, so the range never collapses
    let inputs = vec![AppendixInput::new("Bilag 1.pdf", appendix_pdf(1, "x"))];
    let bundle = generate(inputs, 2).unwrap();

    let pages = page_texts(&bundle);
    assert!(pages[0].contains("(3)"));
    assert!(pages[0].contains("( - 4)"));
}

#[test]
fn test_multibyte_filename_sorts_last_and_assembles() {
    // Names outside the bilag pattern, multi-byte included, go to the back
    // of the bundle instead of failing
    let inputs = vec![
        AppendixInput::new("aæ123", appendix_pdf(1, "odd")),
        AppendixInput::new("Bilag 1.pdf", appendix_pdf(1, "first")),
    ];
    let bundle = generate(inputs, 2).unwrap();

    let pages = page_texts(&bundle);
    assert_eq!(pages.len(), 5);
    assert!(pages[1].contains("(Bilag 1)"));
    // Divider text is WinAnsi-encoded, so the ae byte is not valid UTF-8
    // and decodes lossily
    assert!(pages[3].contains("(a\u{FFFD}123)"));
}

#[test]
fn test_watermark_on_every_page() {
    let inputs = vec![AppendixInput::new("Bilag 1.pdf", appendix_pdf(2, "w"))];
    let bundle = generate(inputs, 2).unwrap();

    for (i, page) in page_texts(&bundle).iter().enumerate() {
        assert!(page.contains("(UDKAST)"), "page {i} should carry the watermark");
    }
}

#[test]
fn test_custom_watermark_text() {
    let config = AssemblyConfig {
        start_page: 2,
        watermark_text: "FORTROLIGT".to_string(),
        ..AssemblyConfig::default()
    };
    let assembler = Assembler::new(config).unwrap();
    let inputs = vec![AppendixInput::new("Bilag 1.pdf", appendix_pdf(1, "w"))];
    let bundle = assembler.assemble(inputs).unwrap();

    assert!(page_texts(&bundle)[0].contains("(FORTROLIGT)"));
}

#[test]
fn test_bundle_preserves_page_dimensions() {
    let inputs = vec![AppendixInput::new("Bilag 1.pdf", appendix_pdf(2, "dim"))];
    let bundle = generate(inputs, 2).unwrap();

    let doc = Document::load_mem(&bundle).unwrap();
    for page_id in doc.get_pages().into_values() {
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap();
        let lopdf::Object::Array(values) = media_box else {
            panic!("MediaBox should be an array");
        };
        assert_eq!(values.len(), 4);
    }
}

#[test]
fn test_output_is_a_loadable_pdf() {
    let inputs = vec![
        AppendixInput::new("Bilag 1.pdf", appendix_pdf(1, "a")),
        AppendixInput::new("notat.pdf", appendix_pdf(1, "b")),
    ];
    let bundle = generate(inputs, 2).unwrap();

    let doc = Document::load_mem(&bundle).unwrap();
    assert!(doc.trailer.get(b"Root").is_ok());
    assert_eq!(doc.get_pages().len(), 5);
}
