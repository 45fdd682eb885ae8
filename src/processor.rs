//! Per-document driver.
//!
//! Plans a stamp for every page, composites it, and leaves saving to the
//! caller so the document is persisted exactly once. Any page error aborts
//! the run before anything is written.

use rayon::prelude::*;
use serde::Serialize;

use crate::config::StampOptions;
use crate::document::{CompositeMode, DocumentProvider};
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::layout::PageLayout;
use crate::placement::{plan_placement, Placement};

/// Summary of the stamp placed on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutcome {
    /// 1-based page number
    pub page: u32,
    pub content_rect: Rect,
    pub content_detected: bool,
    pub total_box: Option<Rect>,
    pub anchor: Point,
    pub font_size: f64,
    /// Final stamp rectangle, top-left origin
    pub rect: Rect,
}

impl PageOutcome {
    fn from_placement(page: u32, placement: &Placement) -> Self {
        Self {
            page,
            content_rect: placement.content_rect,
            content_detected: placement.content_detected,
            total_box: placement.total_box,
            anchor: placement.anchor,
            font_size: placement.raster.font_size,
            rect: placement.rect,
        }
    }
}

/// Stamp every page of `doc` in page order.
///
/// With `parallel` set, layouts are still extracted sequentially but the
/// pure planning step runs on the rayon pool; compositing always happens in
/// page order so the output matches a sequential run.
pub fn stamp_document<D: DocumentProvider>(
    doc: &mut D,
    options: &StampOptions,
    parallel: bool,
) -> Result<Vec<PageOutcome>> {
    let page_count = doc.page_count();
    tracing::info!(pages = page_count, parallel, text = %options.text, "stamping document");

    let layouts = (1..=page_count)
        .map(|page| {
            doc.page_layout(page)
                .map(|layout| (page, layout))
                .map_err(|e| e.on_page(page))
        })
        .collect::<Result<Vec<(u32, PageLayout)>>>()?;

    let plan = |(page, layout): &(u32, PageLayout)| {
        plan_placement(layout, options)
            .map(|placement| (*page, placement))
            .map_err(|e| e.on_page(*page))
    };
    let placements = if parallel {
        layouts.par_iter().map(plan).collect::<Result<Vec<_>>>()?
    } else {
        layouts.iter().map(plan).collect::<Result<Vec<_>>>()?
    };

    let mut outcomes = Vec::with_capacity(placements.len());
    for (page, placement) in placements {
        doc.composite_image(page, &placement.rect, &placement.raster.png, CompositeMode::default())
            .map_err(|e| e.on_page(page))?;

        let outcome = PageOutcome::from_placement(page, &placement);
        tracing::info!(
            page,
            x0 = outcome.rect.x0,
            y0 = outcome.rect.y0,
            x1 = outcome.rect.x1,
            y1 = outcome.rect.y1,
            font_size = outcome.font_size,
            total_found = outcome.total_box.is_some(),
            content_detected = outcome.content_detected,
            "page stamped"
        );
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
