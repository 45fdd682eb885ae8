// End-to-end tests: real PDFs through extraction, placement and compositing

mod common;

use common::{build_pdf, invoice_content, letter_content, page_text, pdf_bytes, PAGE_HEIGHT, PAGE_WIDTH};
use lopdf::Document;
use paidstamp::config::StampOptions;
use paidstamp::document::{DocumentProvider, LopdfDocument};
use paidstamp::geometry::Rect;
use paidstamp::processor::stamp_document;

const MARGIN: f64 = 6.0 - 1e-6;

fn stamped(pages: &[Option<lopdf::content::Content>], parallel: bool) -> (Vec<u8>, Vec<paidstamp::PageOutcome>) {
    let mut doc = LopdfDocument::load_mem(&pdf_bytes(pages)).unwrap();
    let outcomes = stamp_document(&mut doc, &StampOptions::default(), parallel).unwrap();
    (doc.to_bytes().unwrap(), outcomes)
}

#[test]
fn test_invoice_layout_extracted() {
    let doc = LopdfDocument::from_document(build_pdf(&[Some(invoice_content())]));
    let layout = doc.page_layout(1).unwrap();

    assert_eq!((layout.width, layout.height), (PAGE_WIDTH as f64, PAGE_HEIGHT as f64));
    assert!(layout.words.iter().any(|w| w.text == "total"));
    assert!(layout.words.iter().any(|w| w.text == "due"));
    // header, body and total line
    assert_eq!(layout.blocks.len(), 3);

    let total = layout.words.iter().find(|w| w.text == "total").unwrap();
    // baseline at user y 250 is page y 542
    assert!((total.rect.y1 - 544.4).abs() < 1e-6);
    assert!((total.rect.x0 - 400.0).abs() < 1e-6);
}

#[test]
fn test_invoice_stamped_near_total() {
    let (bytes, outcomes) = stamped(&[Some(invoice_content())], false);
    assert_eq!(outcomes.len(), 1);

    let outcome = &outcomes[0];
    assert!(outcome.content_detected);
    let total_box = outcome.total_box.expect("total label found");
    assert!(total_box.x0 < 400.0 && total_box.x1 > 400.0);
    assert!(outcome.content_rect.inset(MARGIN).contains_rect(&outcome.rect));
    assert!(outcome.font_size >= 8.0);

    let reloaded = Document::load_mem(&bytes).unwrap();
    let content = page_text(&reloaded, 1);
    assert!(content.contains("(Invoice 2024-001 for consulting services)"));
    assert!(content.contains("/PaidStamp1 Do"));
}

#[test]
fn test_header_excluded_from_content_rect() {
    let (_, outcomes) = stamped(&[Some(invoice_content())], false);
    // header baseline sits at page y 52, inside the top band
    assert!(outcomes[0].content_rect.y0 > 150.0);
    assert!(outcomes[0].content_rect.x0 >= 72.0 - 1e-6);
}

#[test]
fn test_page_without_total_uses_fallback_anchor() {
    let (_, outcomes) = stamped(&[Some(letter_content())], false);
    let outcome = &outcomes[0];
    assert!(outcome.content_detected);
    assert_eq!(outcome.total_box, None);

    let c = outcome.content_rect;
    let expected = c.point_at(0.60 + 0.015, 0.62 + 0.010);
    assert!((outcome.anchor.x - expected.x).abs() < 1e-9);
    assert!((outcome.anchor.y - expected.y).abs() < 1e-9);
}

#[test]
fn test_blank_page_uses_full_page() {
    let (bytes, outcomes) = stamped(&[None], false);
    let outcome = &outcomes[0];
    assert!(!outcome.content_detected);
    assert_eq!(
        outcome.content_rect,
        Rect::from_size(PAGE_WIDTH as f64, PAGE_HEIGHT as f64)
    );
    assert!(outcome.content_rect.inset(MARGIN).contains_rect(&outcome.rect));

    let reloaded = Document::load_mem(&bytes).unwrap();
    assert!(page_text(&reloaded, 1).contains("/PaidStamp1 Do"));
}

#[test]
fn test_every_page_gets_its_own_stamp() {
    let pages = [Some(invoice_content()), None, Some(letter_content())];
    let (bytes, outcomes) = stamped(&pages, false);
    assert_eq!(outcomes.iter().map(|o| o.page).collect::<Vec<_>>(), vec![1, 2, 3]);

    let reloaded = Document::load_mem(&bytes).unwrap();
    assert_eq!(reloaded.get_pages().len(), 3);
    for page in 1..=3u32 {
        let name = format!("/PaidStamp{} Do", page);
        assert!(page_text(&reloaded, page).contains(&name), "page {}", page);
    }
}

#[test]
fn test_parallel_output_is_byte_identical() {
    let pages = [Some(invoice_content()), Some(letter_content()), None];
    let (seq_bytes, seq) = stamped(&pages, false);
    let (par_bytes, par) = stamped(&pages, true);
    assert_eq!(seq, par);
    assert_eq!(seq_bytes, par_bytes);
}

#[test]
fn test_runs_are_deterministic() {
    let pages = [Some(invoice_content())];
    let (a, _) = stamped(&pages, false);
    let (b, _) = stamped(&pages, false);
    assert_eq!(a, b);
}

#[test]
fn test_save_and_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("invoice.pdf");
    let output = dir.path().join("invoice-paid.pdf");
    std::fs::write(&input, pdf_bytes(&[Some(invoice_content())])).unwrap();

    let mut doc = LopdfDocument::load(&input).unwrap();
    stamp_document(&mut doc, &StampOptions::default(), false).unwrap();
    doc.save(&output).unwrap();

    let reloaded = LopdfDocument::load(&output).unwrap();
    assert_eq!(reloaded.page_count(), 1);
    // the stamp is an image, so extraction still sees the original words
    let layout = reloaded.page_layout(1).unwrap();
    assert!(layout.words.iter().any(|w| w.text == "total"));
}

#[test]
fn test_custom_text_and_width() {
    let options = StampOptions::parse_or_default(r#"{"text":"PAID","wmWidthPctOfContent":0.4}"#);
    let mut doc = LopdfDocument::from_document(build_pdf(&[Some(invoice_content())]));
    let outcomes = stamp_document(&mut doc, &options, false).unwrap();

    let outcome = &outcomes[0];
    let expected_width = (outcome.content_rect.width() * 0.4).max(90.0);
    assert!((outcome.rect.width() - expected_width).abs() < 1e-6);
}

#[test]
fn test_missing_input_is_error() {
    assert!(LopdfDocument::load("/nonexistent/paidstamp/input.pdf").is_err());
    assert!(LopdfDocument::load_mem(b"%PDF-1.5 garbage").is_err());
}
