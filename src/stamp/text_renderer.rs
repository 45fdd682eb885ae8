//! Stamp text measurement and drawing.
//!
//! Text is set in an embedded bold sans-serif face so measurements do not
//! depend on fonts installed on the host. Sizes are em sizes in page units,
//! the same unit the placement engine works in; drawing multiplies them by
//! the supersampling factor.

use ab_glyph::{point, Font, FontRef, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::OnceLock;

use super::raster::blend_pixels;
use crate::constants::{FONT_FIT_MAX_ITERATIONS, FONT_FIT_SHRINK, MIN_FONT_SIZE};
use crate::error::{Result, StampError};

/// Embedded font data (DejaVu Sans Bold, Bitstream Vera derived license).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

/// Parsed once per process; a parse failure is kept and reported on every call.
static STAMP_FONT: OnceLock<std::result::Result<FontRef<'static>, String>> = OnceLock::new();

/// The embedded stamp font, parsed lazily.
pub fn stamp_font() -> Result<&'static FontRef<'static>> {
    STAMP_FONT
        .get_or_init(|| FontRef::try_from_slice(EMBEDDED_FONT_DATA).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| StampError::Render(format!("embedded font is invalid: {}", e)))
}

/// Scale at which one em equals `size` pixels.
fn em_scale(font: &FontRef<'_>, size: f64) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size as f32 * font.height_unscaled() / units_per_em)
}

/// Width of `text` set at em size `size`, kerning included.
pub fn measure_text(text: &str, size: f64) -> Result<f64> {
    let font = stamp_font()?;
    Ok(text_width(font, text, size))
}

fn text_width(font: &FontRef<'_>, text: &str, size: f64) -> f64 {
    let scaled = font.as_scaled(em_scale(font, size));

    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width as f64
}

/// Result of fitting a font size to a maximum width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontFit {
    /// Chosen em size, never below [`MIN_FONT_SIZE`]
    pub size: f64,
    /// Number of measurements taken
    pub iterations: usize,
}

/// Shrink `base_size` until `measure(size) <= max_width`.
///
/// Starts at `max(8, base_size)` and multiplies by 0.92 per step, for at most
/// 30 measurements. The size never drops below 8: once the next step would
/// cross that floor the fitter stops at 8 even if the text still overflows.
pub fn fit_font_size_with<F>(base_size: f64, max_width: f64, mut measure: F) -> FontFit
where
    F: FnMut(f64) -> f64,
{
    let mut size = base_size.max(MIN_FONT_SIZE);
    let mut iterations = 0;

    while iterations < FONT_FIT_MAX_ITERATIONS {
        iterations += 1;
        if measure(size) <= max_width {
            return FontFit { size, iterations };
        }
        let next = size * FONT_FIT_SHRINK;
        if next < MIN_FONT_SIZE {
            return FontFit {
                size: MIN_FONT_SIZE,
                iterations,
            };
        }
        size = next;
    }

    // out of measurements without a fit
    FontFit {
        size: MIN_FONT_SIZE,
        iterations,
    }
}

/// Fit the stamp text against the embedded font.
pub fn fit_font_size(text: &str, base_size: f64, max_width: f64) -> Result<FontFit> {
    let font = stamp_font()?;
    Ok(fit_font_size_with(base_size, max_width, |size| {
        text_width(font, text, size)
    }))
}

/// Vertical metrics of the stamp font at a given em size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Distance from baseline to the top of the tallest glyphs (positive)
    pub ascent: f64,
    /// Distance from baseline to the bottom of descenders (negative)
    pub descent: f64,
}

/// Ascent and descent at em size `size`.
pub fn line_metrics(size: f64) -> Result<LineMetrics> {
    let font = stamp_font()?;
    let scaled = font.as_scaled(em_scale(font, size));
    Ok(LineMetrics {
        ascent: scaled.ascent() as f64,
        descent: scaled.descent() as f64,
    })
}

/// Draw `text` centered on `(center_x, center_y)` of `image`.
///
/// `size` is the em size in pixels; `alpha` is the maximum alpha of fully
/// covered glyph pixels. Glyphs are blended over whatever is already drawn.
pub fn draw_text_centered(
    image: &mut RgbaImage,
    text: &str,
    size: f64,
    center_x: f64,
    center_y: f64,
    color: [u8; 3],
    alpha: u8,
) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    let font = stamp_font()?;
    let scale = em_scale(font, size);
    let scaled = font.as_scaled(scale);

    let width = text_width(font, text, size);
    let baseline_y = center_y + (scaled.ascent() + scaled.descent()) as f64 / 2.0;
    let mut cursor_x = (center_x - width / 2.0) as f32;

    let canvas_width = image.width() as i32;
    let canvas_height = image.height() as i32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(scale, point(cursor_x, baseline_y as f32));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && y >= 0 && x < canvas_width && y < canvas_height {
                    let pixel_alpha = (coverage.clamp(0.0, 1.0) * alpha as f32) as u8;
                    let top = Rgba([color[0], color[1], color[2], pixel_alpha]);
                    let existing = *image.get_pixel(x as u32, y as u32);
                    image.put_pixel(x as u32, y as u32, blend_pixels(existing, top));
                }
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }

    Ok(())
}
