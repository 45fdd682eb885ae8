//! Content region detection.
//!
//! The content region is the union of all text blocks that look like real
//! page content: large enough not to be noise, not confined to the header
//! or footer band, and not sitting in a left sidebar.

use super::TextBlock;
use crate::constants::{
    FOOTER_BAND_PCT, HEADER_BAND_PCT, MIN_BLOCK_HEIGHT, MIN_BLOCK_WIDTH, SIDEBAR_PCT,
};
use crate::geometry::Rect;

/// Decide whether a block counts as page content.
pub fn is_content_block(rect: &Rect, page_width: f64, page_height: f64) -> bool {
    if rect.is_empty() || rect.width() < MIN_BLOCK_WIDTH || rect.height() < MIN_BLOCK_HEIGHT {
        return false;
    }

    // header / footer bands
    if rect.y1 < page_height * HEADER_BAND_PCT || rect.y0 > page_height * FOOTER_BAND_PCT {
        return false;
    }

    // far-left sidebar
    rect.x1 >= page_width * SIDEBAR_PCT
}

/// Union of the qualifying blocks bounded to the page, or `None` when no
/// block qualifies or nothing of the union is on the page.
///
/// Callers fall back to the full page rectangle on `None`.
pub fn detect_content_region(
    page_width: f64,
    page_height: f64,
    blocks: &[TextBlock],
) -> Option<Rect> {
    blocks
        .iter()
        .map(|b| b.rect)
        .filter(|r| is_content_block(r, page_width, page_height))
        .reduce(|acc, r| acc.union(&r))
        .map(|region| region.clamp_to(&Rect::from_size(page_width, page_height)))
        .filter(|region| !region.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const W: f64 = 600.0;
    const H: f64 = 800.0;

    fn blocks(rects: &[Rect]) -> Vec<TextBlock> {
        rects.iter().map(|r| TextBlock::new(*r, "")).collect()
    }

    #[test]
    fn test_single_block_is_region() {
        let b = blocks(&[Rect::new(50.0, 100.0, 550.0, 700.0)]);
        assert_eq!(
            detect_content_region(W, H, &b),
            Some(Rect::new(50.0, 100.0, 550.0, 700.0))
        );
    }

    #[test]
    fn test_no_blocks_is_none() {
        assert_eq!(detect_content_region(W, H, &[]), None);
    }

    #[rstest]
    // too narrow
    #[case(Rect::new(300.0, 300.0, 329.0, 400.0))]
    // too short
    #[case(Rect::new(300.0, 300.0, 400.0, 309.0))]
    // empty
    #[case(Rect::new(300.0, 300.0, 300.0, 300.0))]
    // entirely in the header band (bottom above 96)
    #[case(Rect::new(200.0, 20.0, 500.0, 95.0))]
    // entirely in the footer band (top below 736)
    #[case(Rect::new(200.0, 740.0, 500.0, 790.0))]
    // left sidebar (right edge before 150)
    #[case(Rect::new(10.0, 300.0, 149.0, 600.0))]
    fn test_filtered_blocks(#[case] rect: Rect) {
        assert!(!is_content_block(&rect, W, H));
        assert_eq!(detect_content_region(W, H, &blocks(&[rect])), None);
    }

    #[rstest]
    // straddles the header line
    #[case(Rect::new(200.0, 50.0, 500.0, 97.0))]
    // straddles the footer line
    #[case(Rect::new(200.0, 735.0, 500.0, 790.0))]
    // right edge exactly at the sidebar limit
    #[case(Rect::new(10.0, 300.0, 150.0, 600.0))]
    // exactly minimum size
    #[case(Rect::new(300.0, 300.0, 330.0, 310.0))]
    fn test_boundary_blocks_kept(#[case] rect: Rect) {
        assert!(is_content_block(&rect, W, H));
    }

    #[test]
    fn test_union_of_survivors_only() {
        let b = blocks(&[
            Rect::new(200.0, 20.0, 500.0, 60.0),   // header
            Rect::new(100.0, 150.0, 400.0, 300.0), // content
            Rect::new(10.0, 200.0, 100.0, 700.0),  // sidebar
            Rect::new(250.0, 500.0, 560.0, 650.0), // content
            Rect::new(200.0, 760.0, 500.0, 790.0), // footer
        ]);
        assert_eq!(
            detect_content_region(W, H, &b),
            Some(Rect::new(100.0, 150.0, 560.0, 650.0))
        );
    }

    #[rstest]
    // spills past the left and bottom edges
    #[case(Rect::new(-40.0, 100.0, 300.0, 830.0), Rect::new(0.0, 100.0, 300.0, 800.0))]
    // spills past the right edge
    #[case(Rect::new(200.0, 300.0, 650.0, 500.0), Rect::new(200.0, 300.0, 600.0, 500.0))]
    fn test_region_clamped_to_page(#[case] block: Rect, #[case] expected: Rect) {
        let region = detect_content_region(W, H, &blocks(&[block])).unwrap();
        assert_eq!(region, expected);
        assert!(Rect::from_size(W, H).contains_rect(&region));
    }

    #[test]
    fn test_region_entirely_off_page_is_none() {
        // passes every filter but lies right of the page
        let b = blocks(&[Rect::new(650.0, 300.0, 900.0, 500.0)]);
        assert_eq!(detect_content_region(W, H, &b), None);
    }

    #[test]
    fn test_region_within_page() {
        let b = blocks(&[
            Rect::new(40.0, 120.0, 580.0, 300.0),
            Rect::new(300.0, 400.0, 590.0, 720.0),
        ]);
        let region = detect_content_region(W, H, &b).unwrap();
        assert!(!region.is_empty());
        assert!(Rect::from_size(W, H).contains_rect(&region));
    }
}
