// Constants module - centralized tuning values for the stamp pipeline
//
// Every heuristic threshold the detectors and the placement engine rely on
// lives here, named after what it controls. Fractions are relative to the
// page (or content) size, absolute values are in page units (points).

// =============================================================================
// Content region detection
// =============================================================================

/// Blocks narrower than this are treated as noise
pub const MIN_BLOCK_WIDTH: f64 = 30.0;

/// Blocks shorter than this are treated as noise
pub const MIN_BLOCK_HEIGHT: f64 = 10.0;

/// Blocks ending above this fraction of the page height are header content
pub const HEADER_BAND_PCT: f64 = 0.12;

/// Blocks starting below this fraction of the page height are footer content
pub const FOOTER_BAND_PCT: f64 = 0.92;

/// Blocks whose right edge is left of this fraction of the page width are sidebar content
pub const SIDEBAR_PCT: f64 = 0.25;

// =============================================================================
// Total anchor detection
// =============================================================================

/// Keywords marking a monetary total, checked in this order
pub const TOTAL_KEYWORDS: [&str; 8] = [
    "total",
    "amount due",
    "balance due",
    "balance",
    "due",
    "grand total",
    "total due",
    "invoice total",
];

/// Weight of the vertical position in the candidate score
pub const SCORE_WEIGHT_Y: f64 = 2.0;

/// Weight of the horizontal position in the candidate score
pub const SCORE_WEIGHT_X: f64 = 1.0;

/// Total box growth to the left, as a fraction of page width
pub const TOTAL_BOX_GROW_LEFT_PCT: f64 = 0.10;

/// Total box growth to the right, as a fraction of page width
pub const TOTAL_BOX_GROW_RIGHT_PCT: f64 = 0.22;

/// Total box growth upwards, as a fraction of page height
pub const TOTAL_BOX_GROW_UP_PCT: f64 = 0.03;

/// Total box growth downwards, as a fraction of page height
pub const TOTAL_BOX_GROW_DOWN_PCT: f64 = 0.08;

/// Total boxes narrower than this are rejected
pub const MIN_TOTAL_BOX_WIDTH: f64 = 60.0;

/// Total boxes shorter than this are rejected
pub const MIN_TOTAL_BOX_HEIGHT: f64 = 20.0;

// =============================================================================
// Stamp rendering
// =============================================================================

/// Smallest font size the fitter will return
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Maximum number of shrink steps during font fitting
pub const FONT_FIT_MAX_ITERATIONS: usize = 30;

/// Multiplier applied to the font size on every shrink step
pub const FONT_FIT_SHRINK: f64 = 0.92;

/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f64 = 1.20;

/// Rasterization scale used to supersample the stamp
pub const SUPERSAMPLE: f64 = 8.0;

/// Accent color of the stamp border and text (RGB)
pub const STAMP_COLOR: [u8; 3] = [255, 0, 0];

// =============================================================================
// Placement
// =============================================================================

/// Lower bound of the stamp width in page units
pub const MIN_STAMP_WIDTH: f64 = 90.0;

/// Anchor position inside the total box, as a fraction of its size
pub const TOTAL_ANCHOR_PCT: f64 = 0.55;

/// Fallback anchor inside the content rect, horizontal fraction
pub const FALLBACK_ANCHOR_X_PCT: f64 = 0.60;

/// Fallback anchor inside the content rect, vertical fraction
pub const FALLBACK_ANCHOR_Y_PCT: f64 = 0.62;

/// Divisor turning the stamp width into a base font size
pub const BASE_FONT_DIVISOR: f64 = 3.2;

/// Smallest base font size handed to the fitter
pub const MIN_BASE_FONT_SIZE: f64 = 10.0;

/// Share of the stamp width the text itself may occupy
pub const TEXT_WIDTH_SHARE: f64 = 0.50;

/// Inset from the content rect edges the stamp is clamped into
pub const CLAMP_MARGIN: f64 = 6.0;

// =============================================================================
// Text extraction
// =============================================================================

/// Glyph box height above the baseline, as a fraction of the font size
pub const GLYPH_ASCENT: f64 = 0.8;

/// Glyph box depth below the baseline, as a fraction of the font size
pub const GLYPH_DESCENT: f64 = 0.2;

/// Horizontal gap, as a fraction of the font size, that starts a new word
pub const WORD_GAP_FACTOR: f64 = 0.25;

/// Baseline shift, as a fraction of the font size, that starts a new word or line
pub const BASELINE_TOLERANCE: f64 = 0.2;

/// Vertical gap between lines, as a fraction of the line height, that still joins a block
pub const BLOCK_GAP_FACTOR: f64 = 0.6;

/// Advance width (1/1000 em) for codes a font does not describe
pub const DEFAULT_GLYPH_WIDTH: f64 = 556.0;
