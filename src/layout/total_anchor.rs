//! Total anchor detection.
//!
//! Invoices rarely tag their total, so this looks for a word containing one
//! of a handful of keywords, prefers the one furthest towards the
//! bottom-right of the page, and grows it into a coarse box that should
//! cover both the label and the amount printed next to it.

use super::Word;
use crate::constants::{
    MIN_TOTAL_BOX_HEIGHT, MIN_TOTAL_BOX_WIDTH, SCORE_WEIGHT_X, SCORE_WEIGHT_Y,
    TOTAL_BOX_GROW_DOWN_PCT, TOTAL_BOX_GROW_LEFT_PCT, TOTAL_BOX_GROW_RIGHT_PCT,
    TOTAL_BOX_GROW_UP_PCT, TOTAL_KEYWORDS,
};
use crate::geometry::Rect;

/// First keyword contained in `text`, in keyword order.
///
/// `text` is expected to be normalized already (see [`super::normalize_text`]).
pub fn match_keyword(text: &str) -> Option<&'static str> {
    if text.is_empty() {
        return None;
    }
    TOTAL_KEYWORDS.iter().copied().find(|k| text.contains(k))
}

/// Bottom-right bias of a candidate word: `2·(y1/H) + (x1/W)`.
pub fn candidate_score(rect: &Rect, page_width: f64, page_height: f64) -> f64 {
    (rect.y1 / page_height) * SCORE_WEIGHT_Y + (rect.x1 / page_width) * SCORE_WEIGHT_X
}

/// The keyword word with the highest score. Ties keep the earliest word.
pub fn best_candidate<'a>(
    page_width: f64,
    page_height: f64,
    words: &'a [Word],
) -> Option<&'a Word> {
    let mut best: Option<(&Word, f64)> = None;
    for word in words.iter().filter(|w| match_keyword(&w.text).is_some()) {
        let score = candidate_score(&word.rect, page_width, page_height);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((word, score)),
        }
    }
    best.map(|(word, _)| word)
}

/// Grow a label rect into the coarse total box and clamp it to the page.
pub fn expand_total_box(label: &Rect, page_width: f64, page_height: f64) -> Rect {
    label
        .expand(
            page_width * TOTAL_BOX_GROW_LEFT_PCT,
            page_height * TOTAL_BOX_GROW_UP_PCT,
            page_width * TOTAL_BOX_GROW_RIGHT_PCT,
            page_height * TOTAL_BOX_GROW_DOWN_PCT,
        )
        .clamp_to(&Rect::from_size(page_width, page_height))
}

/// Locate the total box, or `None` when no keyword matches or the box
/// degenerates (e.g. squeezed against a page corner).
pub fn detect_total_box(page_width: f64, page_height: f64, words: &[Word]) -> Option<Rect> {
    let best = best_candidate(page_width, page_height, words)?;
    let total_box = expand_total_box(&best.rect, page_width, page_height);

    if total_box.width() < MIN_TOTAL_BOX_WIDTH || total_box.height() < MIN_TOTAL_BOX_HEIGHT {
        tracing::debug!(
            word = %best.text,
            width = total_box.width(),
            height = total_box.height(),
            "total box too small, ignoring"
        );
        return None;
    }

    Some(total_box)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const W: f64 = 600.0;
    const H: f64 = 800.0;

    fn word(x0: f64, y0: f64, x1: f64, y1: f64, text: &str) -> Word {
        Word::new(Rect::new(x0, y0, x1, y1), text)
    }

    #[rstest]
    #[case("total", Some("total"))]
    #[case("subtotal:", Some("total"))]
    #[case("total due", Some("total"))]
    #[case("balance", Some("balance"))]
    #[case("overdue", Some("due"))]
    #[case("amount due", Some("amount due"))]
    #[case("invoice", None)]
    #[case("", None)]
    fn test_match_keyword(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(match_keyword(text), expected);
    }

    #[test]
    fn test_matching_is_case_and_space_insensitive() {
        let w = Word::new(Rect::new(0.0, 0.0, 10.0, 10.0), "  Balance\n DUE ");
        assert_eq!(match_keyword(&w.text), Some("balance due"));
    }

    #[test]
    fn test_invoice_total_box() {
        let words = vec![word(480.0, 650.0, 560.0, 665.0, "TOTAL DUE")];
        let b = detect_total_box(W, H, &words).unwrap();
        assert!((b.x0 - 420.0).abs() < 1e-9);
        assert_eq!(b.x1, 600.0);
        assert!((b.y0 - 626.0).abs() < 1e-9);
        assert!((b.y1 - 729.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_candidates() {
        let words = vec![word(100.0, 100.0, 150.0, 110.0, "invoice")];
        assert_eq!(detect_total_box(W, H, &words), None);
        assert_eq!(detect_total_box(W, H, &[]), None);
    }

    #[test]
    fn test_prefers_bottom_right() {
        let words = vec![
            word(400.0, 300.0, 450.0, 312.0, "Subtotal"),
            word(100.0, 600.0, 150.0, 612.0, "Due"),
            word(420.0, 600.0, 470.0, 612.0, "Total"),
            word(100.0, 100.0, 140.0, 112.0, "Date"),
        ];
        let best = best_candidate(W, H, &words).unwrap();
        assert_eq!(best.text, "total");
        assert_eq!(best.rect.x0, 420.0);
    }

    #[test]
    fn test_vertical_weight_dominates() {
        // lower on the page beats further right
        let words = vec![
            word(500.0, 200.0, 590.0, 212.0, "total"),
            word(60.0, 600.0, 100.0, 612.0, "total"),
        ];
        let best = best_candidate(W, H, &words).unwrap();
        assert_eq!(best.rect.x0, 60.0);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let words = vec![
            word(300.0, 500.0, 350.0, 512.0, "balance"),
            word(300.0, 500.0, 350.0, 512.0, "total"),
        ];
        let best = best_candidate(W, H, &words).unwrap();
        assert_eq!(best.text, "balance");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let words: Vec<Word> = (0..20)
            .map(|i| {
                let f = i as f64;
                word(20.0 * f, 30.0 * f, 20.0 * f + 40.0, 30.0 * f + 10.0, "total")
            })
            .collect();
        let a = detect_total_box(W, H, &words);
        let b = detect_total_box(W, H, &words);
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_box_rejected() {
        // a page so small the clamped box cannot reach the minimum size
        let words = vec![word(10.0, 10.0, 20.0, 15.0, "total")];
        assert_eq!(detect_total_box(100.0, 100.0, &words), None);
    }

    #[test]
    fn test_box_clamped_to_page() {
        let words = vec![word(560.0, 780.0, 598.0, 795.0, "total")];
        let b = detect_total_box(W, H, &words).unwrap();
        assert_eq!(b.x1, W);
        assert_eq!(b.y1, H);
        assert!(b.x0 >= 0.0 && b.y0 >= 0.0);
    }
}
