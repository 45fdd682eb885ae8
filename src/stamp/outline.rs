//! Rounded-rectangle stamp border.
//!
//! Two interchangeable painters produce the same outline as a coverage mask.
//! [`select_painter`] asks each painter in turn whether it can handle a given
//! outline and uses the first one that says yes; nothing is attempted and
//! then retried on failure.

use ab_glyph_rasterizer::{point, Point as RasterPoint, Rasterizer};

use crate::error::{Result, StampError};
use crate::geometry::Rect;

/// Bezier handle length for a quarter circle, as a fraction of the radius.
const QUARTER_ARC_KAPPA: f32 = 0.552_284_8;

/// A stroked rounded rectangle in pixel space.
///
/// The stroke is centered on `rect`: half of it lies inside, half outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub radius: f64,
    pub stroke_width: f64,
}

impl RoundedRect {
    pub fn new(rect: Rect, radius: f64, stroke_width: f64) -> Self {
        Self {
            rect,
            radius,
            stroke_width,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.rect.x0,
            self.rect.y0,
            self.rect.x1,
            self.rect.y1,
            self.radius,
            self.stroke_width,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    fn max_radius(&self) -> f64 {
        self.rect.width().min(self.rect.height()) / 2.0
    }
}

/// Per-pixel coverage in `[0, 1]`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    fn set(&mut self, x: u32, y: u32, coverage: f32) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = coverage.clamp(0.0, 1.0);
    }

    /// Number of pixels with any coverage.
    pub fn covered_pixels(&self) -> usize {
        self.data.iter().filter(|c| **c > 0.0).count()
    }
}

/// A way of turning a [`RoundedRect`] into a coverage mask.
pub trait OutlinePainter: Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this painter can draw `outline` faithfully.
    fn supports(&self, outline: &RoundedRect) -> bool;

    /// Paint `outline` onto a fresh `width` x `height` mask.
    fn paint(&self, outline: &RoundedRect, width: u32, height: u32) -> Result<CoverageMask>;
}

/// Analytic painter based on the signed distance to a rounded box.
///
/// Only handles well-formed outlines whose radius fits inside the rectangle.
pub struct DistanceFieldPainter;

impl DistanceFieldPainter {
    fn signed_distance(outline: &RoundedRect, px: f64, py: f64) -> f64 {
        let r = &outline.rect;
        let cx = (r.x0 + r.x1) / 2.0;
        let cy = (r.y0 + r.y1) / 2.0;
        let half_w = r.width() / 2.0;
        let half_h = r.height() / 2.0;
        let radius = outline.radius;

        let qx = (px - cx).abs() - half_w + radius;
        let qy = (py - cy).abs() - half_h + radius;
        let outside = qx.max(0.0).hypot(qy.max(0.0));
        let inside = qx.max(qy).min(0.0);
        outside + inside - radius
    }
}

impl OutlinePainter for DistanceFieldPainter {
    fn name(&self) -> &'static str {
        "distance-field"
    }

    fn supports(&self, outline: &RoundedRect) -> bool {
        outline.is_finite()
            && !outline.rect.is_empty()
            && outline.stroke_width > 0.0
            && outline.radius > 0.0
            && outline.radius <= outline.max_radius()
    }

    fn paint(&self, outline: &RoundedRect, width: u32, height: u32) -> Result<CoverageMask> {
        let mut mask = CoverageMask::new(width, height);
        let half_stroke = outline.stroke_width / 2.0;

        for y in 0..height {
            for x in 0..width {
                let d = Self::signed_distance(outline, x as f64 + 0.5, y as f64 + 0.5);
                let coverage = half_stroke - d.abs() + 0.5;
                if coverage > 0.0 {
                    mask.set(x, y, coverage as f32);
                }
            }
        }
        Ok(mask)
    }
}

/// Fallback painter that fills the ring between two rounded paths built from
/// straight lines and cubic quarter arcs.
///
/// Radii larger than the rectangle allows are reduced to fit.
pub struct PathPainter;

#[derive(Debug, Clone, Copy)]
enum Segment {
    Line(RasterPoint, RasterPoint),
    Cubic(RasterPoint, RasterPoint, RasterPoint, RasterPoint),
}

impl Segment {
    fn reversed(self) -> Self {
        match self {
            Segment::Line(a, b) => Segment::Line(b, a),
            Segment::Cubic(a, b, c, d) => Segment::Cubic(d, c, b, a),
        }
    }
}

/// Clockwise (on a y-down canvas) rounded rectangle path.
fn rounded_path(x0: f32, y0: f32, x1: f32, y1: f32, radius: f32) -> Vec<Segment> {
    let r = radius.max(0.0).min((x1 - x0) / 2.0).min((y1 - y0) / 2.0);
    let k = r * QUARTER_ARC_KAPPA;

    let mut path = vec![Segment::Line(point(x0 + r, y0), point(x1 - r, y0))];
    if r > 0.0 {
        path.push(Segment::Cubic(
            point(x1 - r, y0),
            point(x1 - r + k, y0),
            point(x1, y0 + r - k),
            point(x1, y0 + r),
        ));
    }
    path.push(Segment::Line(point(x1, y0 + r), point(x1, y1 - r)));
    if r > 0.0 {
        path.push(Segment::Cubic(
            point(x1, y1 - r),
            point(x1, y1 - r + k),
            point(x1 - r + k, y1),
            point(x1 - r, y1),
        ));
    }
    path.push(Segment::Line(point(x1 - r, y1), point(x0 + r, y1)));
    if r > 0.0 {
        path.push(Segment::Cubic(
            point(x0 + r, y1),
            point(x0 + r - k, y1),
            point(x0, y1 - r + k),
            point(x0, y1 - r),
        ));
    }
    path.push(Segment::Line(point(x0, y1 - r), point(x0, y0 + r)));
    if r > 0.0 {
        path.push(Segment::Cubic(
            point(x0, y0 + r),
            point(x0, y0 + r - k),
            point(x0 + r - k, y0),
            point(x0 + r, y0),
        ));
    }
    path
}

impl OutlinePainter for PathPainter {
    fn name(&self) -> &'static str {
        "path"
    }

    fn supports(&self, outline: &RoundedRect) -> bool {
        outline.is_finite() && !outline.rect.is_empty() && outline.stroke_width > 0.0
    }

    fn paint(&self, outline: &RoundedRect, width: u32, height: u32) -> Result<CoverageMask> {
        if !self.supports(outline) {
            return Err(StampError::Render(format!(
                "cannot paint outline {:?}",
                outline
            )));
        }

        let half = (outline.stroke_width / 2.0) as f32;
        let radius = outline.radius.max(0.0).min(outline.max_radius()) as f32;
        let r = &outline.rect;
        let (x0, y0, x1, y1) = (r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32);

        let mut rasterizer = Rasterizer::new(width as usize, height as usize);
        let mut draw = |segment: Segment| match segment {
            Segment::Line(a, b) => rasterizer.draw_line(a, b),
            Segment::Cubic(a, b, c, d) => rasterizer.draw_cubic(a, b, c, d),
        };

        for segment in rounded_path(x0 - half, y0 - half, x1 + half, y1 + half, radius + half) {
            draw(segment);
        }

        // inner edge, wound the other way so it cuts a hole
        let (ix0, iy0, ix1, iy1) = (x0 + half, y0 + half, x1 - half, y1 - half);
        if ix1 > ix0 && iy1 > iy0 {
            let inner = rounded_path(ix0, iy0, ix1, iy1, (radius - half).max(0.0));
            for segment in inner.into_iter().rev() {
                draw(segment.reversed());
            }
        }

        let mut mask = CoverageMask::new(width, height);
        rasterizer.for_each_pixel_2d(|x, y, coverage| {
            if coverage > 0.0 {
                mask.set(x, y, coverage);
            }
        });
        Ok(mask)
    }
}

static PAINTERS: [&dyn OutlinePainter; 2] = [&DistanceFieldPainter, &PathPainter];

/// First painter able to draw `outline`.
pub fn select_painter(outline: &RoundedRect) -> Option<&'static dyn OutlinePainter> {
    PAINTERS.iter().copied().find(|p| p.supports(outline))
}

/// Paint `outline` with whichever painter supports it.
pub fn paint_outline(outline: &RoundedRect, width: u32, height: u32) -> Result<CoverageMask> {
    let painter = select_painter(outline).ok_or_else(|| {
        StampError::Render(format!("no painter supports outline {:?}", outline))
    })?;
    tracing::trace!(painter = painter.name(), "painting stamp outline");
    painter.paint(outline, width, height)
}
