//! Stamp rendering.
//!
//! Turns the stamp text and style options into a rotated, anti-aliased RGBA
//! raster plus its physical footprint in page units.
//!
//! # Composition
//!
//! - a rounded-rectangle border in the accent color
//! - the text, centered horizontally and vertically, in the same color
//! - both drawn at the configured opacity
//!
//! The canvas carries wide horizontal padding so the rotated silhouette does
//! not clip the text. Everything is drawn at 8x and rotated before encoding;
//! the physical size is the rotated pixel size divided by 8.

pub mod outline;
pub mod raster;
pub mod text_renderer;

// Re-export main types for convenience
pub use outline::{paint_outline, select_painter, OutlinePainter, RoundedRect};
pub use raster::{render_stamp, StampGeometry, StampRaster, StampRequest};
pub use text_renderer::{fit_font_size, fit_font_size_with, measure_text, FontFit};
