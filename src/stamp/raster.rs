//! Supersampled stamp rasterization.
//!
//! The stamp is composed in page units, drawn at [`SUPERSAMPLE`] times that
//! resolution, rotated, and encoded as PNG. The physical footprint is read
//! back from the rotated raster's pixel size, so no rotated-bounding-box
//! math on font metrics is needed.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use super::outline::{paint_outline, RoundedRect};
use super::text_renderer::{draw_text_centered, fit_font_size, measure_text};
use crate::constants::{LINE_HEIGHT_FACTOR, STAMP_COLOR, SUPERSAMPLE};
use crate::error::{Result, StampError};
use crate::geometry::Rect;

/// Largest raster side, in pixels, the renderer will allocate.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// What to render.
#[derive(Debug, Clone, PartialEq)]
pub struct StampRequest<'a> {
    pub text: &'a str,
    /// Starting point for font fitting, in page units
    pub base_font_size: f64,
    /// Width the text itself must fit into, in page units
    pub max_text_width: f64,
    /// Alpha of border and text, clamped into `[0, 1]`
    pub opacity: f64,
    /// Rotation in degrees, clockwise on the y-down page
    pub rotate: f64,
}

/// Unrotated stamp dimensions in page units for a given font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampGeometry {
    pub font_size: f64,
    pub text_width: f64,
    pub text_height: f64,
    pub stroke_width: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub radius: f64,
}

impl StampGeometry {
    pub fn compute(font_size: f64, text_width: f64) -> Self {
        let text_height = font_size * LINE_HEIGHT_FACTOR;
        let stroke_width = (font_size * 0.10).max(6.0);
        let pad_x = (font_size * 0.85).max(10.0) + stroke_width;
        let pad_y = (font_size * 0.15).max(10.0) + stroke_width;

        let canvas_width = text_width + pad_x * 5.0;
        let canvas_height = text_height + pad_y * 1.5;
        let radius = (font_size * 0.35)
            .max(6.0)
            .min(canvas_width.min(canvas_height) / 2.0);

        Self {
            font_size,
            text_width,
            text_height,
            stroke_width,
            canvas_width,
            canvas_height,
            radius,
        }
    }

    /// Border path, inset so the whole stroke stays on the canvas.
    pub fn border_rect(&self) -> Rect {
        Rect::from_size(self.canvas_width, self.canvas_height).inset(self.stroke_width / 2.0)
    }
}

/// A rendered stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StampRaster {
    /// PNG-encoded RGBA image
    pub png: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Physical width after rotation, in page units
    pub width: f64,
    /// Physical height after rotation, in page units
    pub height: f64,
    /// Font size the text was fitted to
    pub font_size: f64,
}

fn pixel_len(units: f64) -> u32 {
    let px = (units * SUPERSAMPLE - 1e-6).ceil();
    if px.is_finite() && px >= 1.0 {
        px.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Map an opacity to an alpha byte.
pub fn opacity_to_alpha(opacity: f64) -> u8 {
    if opacity.is_nan() {
        return 0;
    }
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Render the stamp described by `request`.
pub fn render_stamp(request: &StampRequest<'_>) -> Result<StampRaster> {
    let fit = fit_font_size(request.text, request.base_font_size, request.max_text_width)?;
    let geometry = StampGeometry::compute(fit.size, measure_text(request.text, fit.size)?);
    let alpha = opacity_to_alpha(request.opacity);

    let width = pixel_len(geometry.canvas_width);
    let height = pixel_len(geometry.canvas_height);
    if width > MAX_RASTER_SIDE || height > MAX_RASTER_SIDE {
        return Err(StampError::Render(format!(
            "stamp canvas of {}x{} pixels exceeds the {} pixel limit",
            width, height, MAX_RASTER_SIDE
        )));
    }

    let mut canvas = RgbaImage::new(width, height);

    let border = geometry.border_rect();
    let outline = RoundedRect::new(
        Rect::new(
            border.x0 * SUPERSAMPLE,
            border.y0 * SUPERSAMPLE,
            border.x1 * SUPERSAMPLE,
            border.y1 * SUPERSAMPLE,
        ),
        geometry.radius * SUPERSAMPLE,
        geometry.stroke_width * SUPERSAMPLE,
    );
    let mask = paint_outline(&outline, width, height)?;
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let coverage = mask.get(x, y);
        if coverage > 0.0 {
            let a = (coverage * alpha as f32).round() as u8;
            *pixel = blend_pixels(
                *pixel,
                Rgba([STAMP_COLOR[0], STAMP_COLOR[1], STAMP_COLOR[2], a]),
            );
        }
    }

    draw_text_centered(
        &mut canvas,
        request.text,
        geometry.font_size * SUPERSAMPLE,
        width as f64 / 2.0,
        height as f64 / 2.0,
        STAMP_COLOR,
        alpha,
    )?;

    let rotated = rotate_image(&canvas, request.rotate);
    let (pixel_width, pixel_height) = rotated.dimensions();

    let mut png = Vec::new();
    rotated.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    tracing::debug!(
        font_size = geometry.font_size,
        fit_iterations = fit.iterations,
        canvas_width = geometry.canvas_width,
        canvas_height = geometry.canvas_height,
        pixel_width,
        pixel_height,
        "stamp rendered"
    );

    Ok(StampRaster {
        png,
        pixel_width,
        pixel_height,
        width: pixel_width as f64 / SUPERSAMPLE,
        height: pixel_height as f64 / SUPERSAMPLE,
        font_size: geometry.font_size,
    })
}

/// Porter-Duff "over" of `top` onto `bottom`, straight alpha.
pub(crate) fn blend_pixels(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;

    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let result = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Rotate an image by `degrees`, clockwise on a y-down canvas.
///
/// The output is sized to the rotated bounding box and sampled bilinearly in
/// premultiplied space; pixels outside the source are transparent. Whole
/// turns return an unchanged copy.
pub(crate) fn rotate_image(image: &RgbaImage, degrees: f64) -> RgbaImage {
    if !degrees.is_finite() || degrees.rem_euclid(360.0) == 0.0 {
        return image.clone();
    }

    let radians = degrees.to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f64;
    let src_h = image.height() as f64;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    let corners = [(-cx, -cy), (cx, -cy), (-cx, cy), (cx, cy)];
    let rotated_corners: Vec<(f64, f64)> = corners
        .iter()
        .map(|(x, y)| (x * cos - y * sin, x * sin + y * cos))
        .collect();

    let min_x = rotated_corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
    let max_x = rotated_corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = rotated_corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    let max_y = rotated_corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

    let dst_w = ((max_x - min_x - 1e-6).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y - 1e-6).ceil() as u32).max(1);
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut rotated = RgbaImage::new(dst_w, dst_h);

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            // inverse rotation of the destination pixel center
            let rx = dx as f64 + 0.5 - dst_cx;
            let ry = dy as f64 + 0.5 - dst_cy;
            let sx = rx * cos + ry * sin + cx - 0.5;
            let sy = -rx * sin + ry * cos + cy - 0.5;

            if sx <= -1.0 || sy <= -1.0 || sx >= src_w || sy >= src_h {
                continue;
            }
            rotated.put_pixel(dx, dy, sample_bilinear(image, sx, sy));
        }
    }

    rotated
}

fn sample_bilinear(image: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let texel = |x: f64, y: f64| -> [f64; 4] {
        if x < 0.0 || y < 0.0 || x >= image.width() as f64 || y >= image.height() as f64 {
            return [0.0; 4];
        }
        let p = image.get_pixel(x as u32, y as u32);
        let a = p[3] as f64 / 255.0;
        [p[0] as f64 * a, p[1] as f64 * a, p[2] as f64 * a, p[3] as f64]
    };

    let p00 = texel(x0, y0);
    let p10 = texel(x0 + 1.0, y0);
    let p01 = texel(x0, y0 + 1.0);
    let p11 = texel(x0 + 1.0, y0 + 1.0);

    let interpolate = |c: usize| -> f64 {
        p00[c] * (1.0 - fx) * (1.0 - fy)
            + p10[c] * fx * (1.0 - fy)
            + p01[c] * (1.0 - fx) * fy
            + p11[c] * fx * fy
    };

    let alpha = interpolate(3);
    if alpha < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }
    let unpremultiply =
        |c: usize| -> u8 { (interpolate(c) * 255.0 / alpha).round().clamp(0.0, 255.0) as u8 };

    Rgba([
        unpremultiply(0),
        unpremultiply(1),
        unpremultiply(2),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}
