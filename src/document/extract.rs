//! Text layout extraction from page content streams.
//!
//! Walks the decoded content stream of a page while tracking the graphics
//! transformation stack and the text state, and emits one box per shown
//! glyph. Glyph boxes are then grouped into words, words into lines and lines
//! into blocks.
//!
//! Only what the detectors need is modeled: positions and sizes are
//! reasonably accurate for simple (single-byte) fonts, text is decoded as
//! Latin-1, and form XObjects are not entered.

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

use super::{as_f64, inherited, resolve, resolve_dict, PageBox};
use crate::constants::{
    BASELINE_TOLERANCE, BLOCK_GAP_FACTOR, DEFAULT_GLYPH_WIDTH, GLYPH_ASCENT, GLYPH_DESCENT,
    WORD_GAP_FACTOR,
};
use crate::error::Result;
use crate::geometry::{Ctm, Point, Rect};
use crate::layout::TextBlock;

/// Helvetica widths for codes 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722, 667,
    611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500,
    222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Glyph advance widths of one font resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    first_char: i64,
    widths: Vec<f64>,
    missing_width: f64,
    monospace: Option<f64>,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::helvetica()
    }
}

impl FontMetrics {
    /// Built-in metrics for the standard sans-serif face.
    pub fn helvetica() -> Self {
        Self {
            first_char: 32,
            widths: HELVETICA_WIDTHS.iter().map(|w| *w as f64).collect(),
            missing_width: DEFAULT_GLYPH_WIDTH,
            monospace: None,
        }
    }

    /// Explicit widths starting at `first_char`.
    pub fn with_widths(first_char: i64, widths: Vec<f64>, missing_width: f64) -> Self {
        Self {
            first_char,
            widths,
            missing_width,
            monospace: None,
        }
    }

    /// Read `/Widths`, `/FirstChar` and `/MissingWidth` from a font
    /// dictionary. Standard fonts without widths get built-in metrics.
    pub fn from_font_dict(doc: &Document, font: &Dictionary) -> Self {
        let missing_width = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| resolve_dict(doc, o))
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(as_f64);

        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| resolve(doc, w).and_then(as_f64).unwrap_or(0.0))
                    .collect::<Vec<f64>>()
            });

        match widths {
            Some(widths) if !widths.is_empty() => {
                let first_char = font
                    .get(b"FirstChar")
                    .ok()
                    .and_then(as_f64)
                    .map(|v| v as i64)
                    .unwrap_or(0);
                Self::with_widths(
                    first_char,
                    widths,
                    missing_width.unwrap_or(DEFAULT_GLYPH_WIDTH),
                )
            }
            _ => {
                let base = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_default();
                let mut metrics = Self::helvetica();
                if base.contains("Courier") {
                    metrics.monospace = Some(600.0);
                }
                if let Some(mw) = missing_width {
                    metrics.missing_width = mw;
                }
                metrics
            }
        }
    }

    /// Advance width of `code` in 1/1000 em.
    pub fn width(&self, code: u8) -> f64 {
        if let Some(w) = self.monospace {
            return w;
        }
        let idx = code as i64 - self.first_char;
        if idx >= 0 {
            if let Some(w) = self.widths.get(idx as usize) {
                if *w > 0.0 {
                    return *w;
                }
            }
        }
        self.missing_width
    }
}

/// Font resources of a page, keyed by resource name.
pub type FontTable = BTreeMap<Vec<u8>, FontMetrics>;

/// Collect the font resources visible to a page (inherited resources included).
pub fn page_fonts(doc: &Document, page_id: ObjectId) -> FontTable {
    let mut table = FontTable::new();
    let fonts = inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve_dict(doc, o))
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|o| resolve_dict(doc, o));

    if let Some(fonts) = fonts {
        for (name, obj) in fonts.iter() {
            if let Some(font) = resolve_dict(doc, obj) {
                table.insert(name.clone(), FontMetrics::from_font_dict(doc, font));
            }
        }
    }
    table
}

/// One shown glyph in page space.
#[derive(Debug, Clone, PartialEq)]
struct Glyph {
    rect: Rect,
    ch: char,
    baseline: f64,
    size: f64,
}

/// A run of non-space glyphs on one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWord {
    pub rect: Rect,
    /// Text as extracted, not normalized
    pub text: String,
    /// Page-space y of the baseline
    pub baseline: f64,
    /// Effective font size in page units
    pub size: f64,
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
    matrix: Ctm,
    line_matrix: Ctm,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            matrix: Ctm::identity(),
            line_matrix: Ctm::identity(),
        }
    }
}

impl TextState {
    fn set_matrix(&mut self, m: Ctm) {
        self.matrix = m;
        self.line_matrix = m;
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translation(tx, ty).concat(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, tx: f64) {
        self.matrix = Ctm::translation(tx, 0.0).concat(&self.matrix);
    }
}

struct TextWalker<'a> {
    fonts: &'a FontTable,
    fallback: FontMetrics,
    page_box: &'a PageBox,
    ctm: Ctm,
    stack: Vec<Ctm>,
    text: TextState,
    glyphs: Vec<Glyph>,
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(as_f64).collect()
}

fn matrix_from(operands: &[Object]) -> Option<Ctm> {
    let n = numbers(operands);
    (n.len() == 6).then(|| Ctm::new(n[0], n[1], n[2], n[3], n[4], n[5]))
}

impl<'a> TextWalker<'a> {
    fn new(fonts: &'a FontTable, page_box: &'a PageBox) -> Self {
        Self {
            fonts,
            fallback: FontMetrics::helvetica(),
            page_box,
            ctm: Ctm::identity(),
            stack: Vec::new(),
            text: TextState::default(),
            glyphs: Vec::new(),
        }
    }

    fn run(mut self, content: &Content) -> Vec<Glyph> {
        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => self.stack.push(self.ctm),
                "Q" => self.ctm = self.stack.pop().unwrap_or_default(),
                "cm" => {
                    if let Some(m) = matrix_from(operands) {
                        self.ctm = m.concat(&self.ctm);
                    }
                }
                "BT" => self.text.set_matrix(Ctm::identity()),
                "Tf" => {
                    if let [name, size] = operands {
                        self.text.font = name.as_name().ok().map(|n| n.to_vec());
                        self.text.size = as_f64(size).unwrap_or(0.0);
                    }
                }
                "Tc" => self.set_number(operands, |t, v| t.char_spacing = v),
                "Tw" => self.set_number(operands, |t, v| t.word_spacing = v),
                "Tz" => self.set_number(operands, |t, v| t.horizontal_scale = v / 100.0),
                "TL" => self.set_number(operands, |t, v| t.leading = v),
                "Ts" => self.set_number(operands, |t, v| t.rise = v),
                "Td" => {
                    if let [tx, ty] = numbers(operands)[..] {
                        self.text.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let [tx, ty] = numbers(operands)[..] {
                        self.text.leading = -ty;
                        self.text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_from(operands) {
                        self.text.set_matrix(m);
                    }
                }
                "T*" => self.text.next_line(),
                "Tj" => {
                    if let Some(bytes) = operands.first().and_then(string_bytes) {
                        self.show(bytes);
                    }
                }
                "'" => {
                    self.text.next_line();
                    if let Some(bytes) = operands.first().and_then(string_bytes) {
                        self.show(bytes);
                    }
                }
                "\"" => {
                    if let [aw, ac, s] = operands {
                        self.text.word_spacing = as_f64(aw).unwrap_or(0.0);
                        self.text.char_spacing = as_f64(ac).unwrap_or(0.0);
                        self.text.next_line();
                        if let Some(bytes) = string_bytes(s) {
                            self.show(bytes);
                        }
                    }
                }
                "TJ" => {
                    if let Some(Ok(items)) = operands.first().map(|o| o.as_array()) {
                        for item in items {
                            if let Some(bytes) = string_bytes(item) {
                                self.show(bytes);
                            } else if let Some(adjust) = as_f64(item) {
                                let tx = -adjust / 1000.0
                                    * self.text.size
                                    * self.text.horizontal_scale;
                                self.text.advance(tx);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        self.glyphs
    }

    fn set_number(&mut self, operands: &[Object], apply: impl FnOnce(&mut TextState, f64)) {
        if let Some(v) = operands.first().and_then(as_f64) {
            apply(&mut self.text, v);
        }
    }

    fn show(&mut self, bytes: &[u8]) {
        let metrics = self
            .text
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback);
        let size = self.text.size;
        let h = self.text.horizontal_scale;
        let rise = self.text.rise;

        for &code in bytes {
            let w0 = metrics.width(code) / 1000.0;
            let trm = self.text.matrix.concat(&self.ctm);

            let corners = [
                Point::new(0.0, rise - GLYPH_DESCENT * size),
                Point::new(w0 * size * h, rise - GLYPH_DESCENT * size),
                Point::new(0.0, rise + GLYPH_ASCENT * size),
                Point::new(w0 * size * h, rise + GLYPH_ASCENT * size),
            ]
            .map(|p| self.page_box.to_page(trm.transform_point(p)));

            let rect = corners
                .iter()
                .skip(1)
                .fold(Rect::new(corners[0].x, corners[0].y, corners[0].x, corners[0].y), |r, p| {
                    Rect::new(r.x0.min(p.x), r.y0.min(p.y), r.x1.max(p.x), r.y1.max(p.y))
                });
            let baseline = self
                .page_box
                .to_page(trm.transform_point(Point::new(0.0, rise)))
                .y;

            self.glyphs.push(Glyph {
                rect,
                ch: code as char,
                baseline,
                size: size * trm.vertical_scale(),
            });

            let mut tx = w0 * size + self.text.char_spacing;
            if code == b' ' {
                tx += self.text.word_spacing;
            }
            self.text.advance(tx * h);
        }
    }
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

fn same_baseline(a: f64, b: f64, size: f64) -> bool {
    (a - b).abs() <= size.max(1.0) * BASELINE_TOLERANCE
}

/// Group glyphs into words: split on whitespace, baseline changes and gaps.
fn assemble_words(glyphs: Vec<Glyph>) -> Vec<RawWord> {
    let mut words = Vec::new();
    let mut current: Option<RawWord> = None;

    for glyph in glyphs {
        if glyph.ch.is_whitespace() || glyph.ch.is_control() {
            words.extend(current.take());
            continue;
        }

        if let Some(word) = current.as_mut() {
            let gap = glyph.rect.x0 - word.rect.x1;
            let joins = same_baseline(glyph.baseline, word.baseline, word.size)
                && gap <= word.size * WORD_GAP_FACTOR
                && gap >= -word.size;
            if joins {
                word.rect = word.rect.union(&glyph.rect);
                word.text.push(glyph.ch);
                continue;
            }
            words.extend(current.take());
        }

        current = Some(RawWord {
            rect: glyph.rect,
            text: glyph.ch.to_string(),
            baseline: glyph.baseline,
            size: glyph.size,
        });
    }
    words.extend(current);
    words
}

/// Words shown on a page, in content-stream order.
pub fn page_words(doc: &Document, page_id: ObjectId, page_box: &PageBox) -> Result<Vec<RawWord>> {
    let bytes = doc.get_page_content(page_id)?;
    let content = Content::decode(&bytes)?;
    let fonts = page_fonts(doc, page_id);
    Ok(words_from_content(&content, &fonts, page_box))
}

/// Words in an already decoded content stream.
pub fn words_from_content(content: &Content, fonts: &FontTable, page_box: &PageBox) -> Vec<RawWord> {
    let glyphs = TextWalker::new(fonts, page_box).run(content);
    assemble_words(glyphs)
}

struct Line {
    rect: Rect,
    text: String,
    baseline: f64,
    size: f64,
}

/// Merge words into lines and vertically adjacent, overlapping lines into
/// blocks.
pub fn group_blocks(words: &[RawWord]) -> Vec<TextBlock> {
    let mut lines: Vec<Line> = Vec::new();
    for word in words {
        match lines.last_mut() {
            Some(line) if same_baseline(line.baseline, word.baseline, line.size) => {
                line.rect = line.rect.union(&word.rect);
                line.text.push(' ');
                line.text.push_str(&word.text);
            }
            _ => lines.push(Line {
                rect: word.rect,
                text: word.text.clone(),
                baseline: word.baseline,
                size: word.size,
            }),
        }
    }

    let mut blocks: Vec<(TextBlock, Rect)> = Vec::new();
    for line in lines {
        if let Some((block, last_line)) = blocks.last_mut() {
            let gap = line.rect.y0 - last_line.y1;
            let line_height = line.rect.height().max(last_line.height());
            let overlaps = line.rect.x0 <= block.rect.x1 && line.rect.x1 >= block.rect.x0;
            if overlaps && gap <= line_height * BLOCK_GAP_FACTOR && gap >= -line_height {
                block.rect = block.rect.union(&line.rect);
                block.text.push('\n');
                block.text.push_str(&line.text);
                *last_line = line.rect;
                continue;
            }
        }
        let rect = line.rect;
        blocks.push((TextBlock::new(rect, line.text), rect));
    }

    blocks.into_iter().map(|(block, _)| block).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::StringFormat;

    const PAGE: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 600.0,
        ury: 800.0,
    };

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn show_at(x: i64, y: i64, size: i64, s: &str) -> Vec<Operation> {
        vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(size)]),
            op("Td", vec![Object::Integer(x), Object::Integer(y)]),
            op("Tj", vec![text(s)]),
            op("ET", vec![]),
        ]
    }

    fn words(operations: Vec<Operation>) -> Vec<RawWord> {
        let fonts = FontTable::new();
        words_from_content(&Content { operations }, &fonts, &PAGE)
    }

    #[test]
    fn test_single_word_box() {
        let w = words(show_at(100, 700, 10, "Total"));
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].text, "Total");
        // T=611 o=556 t=278 a=556 l=222 -> 2223/1000 * 10
        assert!((w[0].rect.x0 - 100.0).abs() < 1e-9);
        assert!((w[0].rect.x1 - 122.23).abs() < 1e-9);
        // baseline at page y 100, ascent 8, descent 2
        assert!((w[0].rect.y0 - 92.0).abs() < 1e-9);
        assert!((w[0].rect.y1 - 102.0).abs() < 1e-9);
        assert!((w[0].baseline - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_spaces_split_words() {
        let w = words(show_at(100, 700, 12, "TOTAL DUE"));
        let texts: Vec<&str> = w.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["TOTAL", "DUE"]);
        assert!(w[1].rect.x0 > w[0].rect.x1);
    }

    #[test]
    fn test_tj_kerning_gap_splits_words() {
        let mut ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("Td", vec![Object::Integer(50), Object::Integer(500)]),
        ];
        ops.push(op(
            "TJ",
            vec![Object::Array(vec![
                text("Am"),
                Object::Integer(-20),
                text("ount"),
                Object::Integer(-2000),
                text("Due"),
            ])],
        ));
        ops.push(op("ET", vec![]));
        let texts: Vec<String> = words(ops).into_iter().map(|w| w.text).collect();
        assert_eq!(texts, vec!["Amount", "Due"]);
    }

    #[test]
    fn test_text_matrix_and_cm() {
        let ops = vec![
            op("q", vec![]),
            op(
                "cm",
                vec![2, 0, 0, 2, 10, 20].into_iter().map(Object::Integer).collect(),
            ),
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(5)]),
            op(
                "Tm",
                vec![1, 0, 0, 1, 100, 300].into_iter().map(Object::Integer).collect(),
            ),
            op("Tj", vec![text("due")]),
            op("ET", vec![]),
            op("Q", vec![]),
        ];
        let w = words(ops);
        assert_eq!(w.len(), 1);
        // origin (100, 300) scaled by 2 and shifted -> (210, 620) user space
        assert!((w[0].rect.x0 - 210.0).abs() < 1e-9);
        assert!((w[0].baseline - 180.0).abs() < 1e-9);
        assert!((w[0].size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_leading_and_next_line() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("TL", vec![Object::Integer(14)]),
            op("Td", vec![Object::Integer(72), Object::Integer(700)]),
            op("Tj", vec![text("Invoice")]),
            op("'", vec![text("Balance")]),
            op("ET", vec![]),
        ];
        let w = words(ops);
        assert_eq!(w.len(), 2);
        assert!((w[1].baseline - w[0].baseline - 14.0).abs() < 1e-9);
        assert_eq!(w[1].rect.x0, w[0].rect.x0);
    }

    #[test]
    fn test_explicit_widths() {
        let mut fonts = FontTable::new();
        fonts.insert(b"F1".to_vec(), FontMetrics::with_widths(65, vec![1000.0, 500.0], 250.0));
        let w = words_from_content(
            &Content {
                operations: show_at(0, 700, 10, "ABC"),
            },
            &fonts,
            &PAGE,
        );
        // A=1000, B=500, C missing=250
        assert!((w[0].rect.x1 - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_lookup() {
        let m = FontMetrics::helvetica();
        assert_eq!(m.width(b'A'), 667.0);
        assert_eq!(m.width(b' '), 278.0);
        assert_eq!(m.width(200), DEFAULT_GLYPH_WIDTH);
    }

    #[test]
    fn test_group_blocks() {
        let mut ops = show_at(72, 700, 10, "Invoice number 42");
        ops.extend(show_at(72, 688, 10, "Issued today"));
        ops.extend(show_at(300, 300, 10, "Total 100.00"));
        let blocks = group_blocks(&words(ops));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Invoice number 42\nIssued today");
        assert!(blocks[0].rect.y1 < blocks[1].rect.y0);
        assert_eq!(blocks[1].text, "Total 100.00");
    }

    #[test]
    fn test_empty_content() {
        assert!(words(vec![]).is_empty());
        assert!(group_blocks(&[]).is_empty());
    }
}
