//! Stamp placement.
//!
//! Combines the content region, the total anchor and the rendered stamp into
//! the final on-page rectangle:
//!
//! 1. content rect (detected, or the full page)
//! 2. stamp target width from the content width
//! 3. anchor inside the total box, or a content-relative fallback
//! 4. anchor nudge by the configured content fractions
//! 5. font fit and render
//! 6. scale the rotated raster to the target width
//! 7. center the scaled rect on the anchor
//! 8. translate (never resize) it into the content rect minus a margin
//!
//! Every step is a pure function of the page layout and the options.

use crate::config::StampOptions;
use crate::constants::{
    BASE_FONT_DIVISOR, CLAMP_MARGIN, FALLBACK_ANCHOR_X_PCT, FALLBACK_ANCHOR_Y_PCT,
    MIN_BASE_FONT_SIZE, MIN_STAMP_WIDTH, TEXT_WIDTH_SHARE, TOTAL_ANCHOR_PCT,
};
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::layout::{detect_content_region, detect_total_box, PageLayout};
use crate::stamp::{render_stamp, StampRaster, StampRequest};

/// Where and what to stamp on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Content rect the stamp was clamped into
    pub content_rect: Rect,
    /// False when no block qualified and the full page was used
    pub content_detected: bool,
    pub total_box: Option<Rect>,
    /// Anchor after the configured nudge, before clamping
    pub anchor: Point,
    pub target_width: f64,
    /// Page-unit size of one raster unit after scaling
    pub scale: f64,
    /// Final stamp rectangle in page space
    pub rect: Rect,
    pub raster: StampRaster,
}

/// Stamp width before rendering: `max(90, content width × fraction)`.
pub fn target_stamp_width(content: &Rect, options: &StampOptions) -> f64 {
    (content.width() * options.wm_width_pct_of_content).max(MIN_STAMP_WIDTH)
}

/// Anchor point for the stamp center, nudge included.
pub fn compute_anchor(content: &Rect, total_box: Option<&Rect>, options: &StampOptions) -> Point {
    let base = match total_box {
        Some(b) => b.point_at(TOTAL_ANCHOR_PCT, TOTAL_ANCHOR_PCT),
        None => content.point_at(FALLBACK_ANCHOR_X_PCT, FALLBACK_ANCHOR_Y_PCT),
    };
    base.offset(
        content.width() * options.shift_x_pct_of_content,
        content.height() * options.shift_y_pct_of_content,
    )
}

/// Font size the fitter starts from and the width the text must fit.
pub fn font_constraints(target_width: f64) -> (f64, f64) {
    (
        (target_width / BASE_FONT_DIVISOR).max(MIN_BASE_FONT_SIZE),
        target_width * TEXT_WIDTH_SHARE,
    )
}

/// Factor mapping the raw raster width onto the target width.
///
/// Degenerate raw widths map to 1.
pub fn scale_factor(target_width: f64, raw_width: f64) -> f64 {
    if raw_width > 0.0 && raw_width.is_finite() {
        target_width / raw_width
    } else {
        1.0
    }
}

/// Translate `rect` into `bounds` shrunk by `margin`, one axis at a time.
///
/// When the rect is larger than the shrunk bounds the far edge wins and the
/// near edge is left overflowing; the rect is never resized.
pub fn clamp_into(rect: &Rect, bounds: &Rect, margin: f64) -> Rect {
    let inner = bounds.inset(margin);

    let mut dx = 0.0;
    if rect.x0 < inner.x0 {
        dx = inner.x0 - rect.x0;
    }
    if rect.x1 > inner.x1 {
        dx = inner.x1 - rect.x1;
    }

    let mut dy = 0.0;
    if rect.y0 < inner.y0 {
        dy = inner.y0 - rect.y0;
    }
    if rect.y1 > inner.y1 {
        dy = inner.y1 - rect.y1;
    }

    rect.translate(dx, dy)
}

/// Plan the stamp for one page.
pub fn plan_placement(layout: &PageLayout, options: &StampOptions) -> Result<Placement> {
    let detected = detect_content_region(layout.width, layout.height, &layout.blocks);
    let content_detected = detected.is_some();
    let content_rect = detected.unwrap_or_else(|| {
        tracing::debug!("no content blocks qualified, using the full page");
        layout.page_rect()
    });

    let target_width = target_stamp_width(&content_rect, options);

    let total_box = detect_total_box(layout.width, layout.height, &layout.words);
    if total_box.is_none() {
        tracing::debug!("no total label found, using the content fallback anchor");
    }
    let anchor = compute_anchor(&content_rect, total_box.as_ref(), options);

    let (base_font_size, max_text_width) = font_constraints(target_width);
    let raster = render_stamp(&StampRequest {
        text: &options.text,
        base_font_size,
        max_text_width,
        opacity: options.opacity,
        rotate: options.rotate,
    })?;

    let scale = scale_factor(target_width, raster.width);
    let centered = Rect::centered_at(anchor, raster.width * scale, raster.height * scale);
    let rect = clamp_into(&centered, &content_rect, CLAMP_MARGIN);

    Ok(Placement {
        content_rect,
        content_detected,
        total_box,
        anchor,
        target_width,
        scale,
        rect,
        raster,
    })
}
