//! Page layout facts and the detectors that read them.
//!
//! A [`PageLayout`] is the read-only input for one page: its size plus the
//! block-level and word-level text boxes produced by the document layer.
//! Nothing here carries state between pages.
//!
//! - [`content_region`] infers where the real content of the page lives
//! - [`total_anchor`] looks for the label of the monetary total

pub mod content_region;
pub mod total_anchor;

use crate::geometry::Rect;

pub use content_region::detect_content_region;
pub use total_anchor::{detect_total_box, match_keyword};

/// A block of text as reported by block-level extraction.
///
/// Only the rectangle matters to the detectors; the text is kept for
/// logging and debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub rect: Rect,
    pub text: String,
}

impl TextBlock {
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
        }
    }
}

/// A single extracted word with its normalized (lowercase,
/// single-spaced) text.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub rect: Rect,
    pub text: String,
}

impl Word {
    /// Create a word, normalizing the raw extracted string.
    pub fn new(rect: Rect, raw: &str) -> Self {
        Self {
            rect,
            text: normalize_text(raw),
        }
    }
}

/// Lowercase and collapse all whitespace runs to single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything the pipeline knows about one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    pub blocks: Vec<TextBlock>,
    pub words: Vec<Word>,
}

impl PageLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            blocks: Vec::new(),
            words: Vec::new(),
        }
    }

    pub fn with_block(mut self, rect: Rect) -> Self {
        self.blocks.push(TextBlock::new(rect, ""));
        self
    }

    pub fn with_word(mut self, rect: Rect, text: &str) -> Self {
        self.words.push(Word::new(rect, text));
        self
    }

    /// The full page rectangle.
    pub fn page_rect(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}
