// Shared fixtures: small invoice-like PDFs built in memory with lopdf

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;

fn text_ops(ops: &mut Vec<Operation>, x: i64, y: i64, lines: &[&str]) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
    ops.push(Operation::new("TL", vec![14.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    ops.push(Operation::new("ET", vec![]));
}

/// Content of a typical invoice page: a body of line items and a total.
pub fn invoice_content() -> Content {
    let mut operations = Vec::new();
    text_ops(&mut operations, 72, 740, &["ACME Supplies"]);
    text_ops(
        &mut operations,
        72,
        600,
        &[
            "Invoice 2024-001 for consulting services",
            "Design review and implementation work",
            "Travel and accommodation expenses",
            "Hosting for the period January to March",
        ],
    );
    text_ops(&mut operations, 400, 250, &["Total Due 1,250.00"]);
    Content { operations }
}

/// Content without any total label.
pub fn letter_content() -> Content {
    let mut operations = Vec::new();
    text_ops(
        &mut operations,
        72,
        600,
        &[
            "Thank you for your business this year",
            "We look forward to working with you again",
        ],
    );
    Content { operations }
}

/// Build a document with one page per entry; `None` makes a blank page.
pub fn build_pdf(pages: &[Option<Content>]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for content in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        if let Some(content) = content {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            page.set("Contents", content_id);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn pdf_bytes(pages: &[Option<Content>]) -> Vec<u8> {
    let mut doc = build_pdf(pages);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Decoded content of page `page` (1-based) as text.
pub fn page_text(doc: &Document, page: u32) -> String {
    let id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned()
}
