//! Document access.
//!
//! The pipeline only talks to documents through [`DocumentProvider`]: page
//! sizes, block- and word-level text boxes, image compositing and a single
//! save at the end. [`LopdfDocument`] is the PDF implementation.
//!
//! Pages are numbered from 1. Every rectangle crossing this boundary is in
//! page space (top-left origin, `y` down); conversion to and from PDF user
//! space happens inside the implementation.

pub mod composite;
pub mod extract;

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, StampError};
use crate::geometry::{Point, Rect};
use crate::layout::{PageLayout, TextBlock, Word};

/// How an image is drawn into its target rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeMode {
    /// Draw above the existing page content
    pub overlay: bool,
    /// Keep the image aspect ratio, centering it inside the rectangle
    pub keep_proportion: bool,
}

impl Default for CompositeMode {
    fn default() -> Self {
        Self {
            overlay: true,
            keep_proportion: true,
        }
    }
}

/// The document operations the stamping pipeline needs.
pub trait DocumentProvider {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Page width and height in page units.
    fn page_size(&self, page: u32) -> Result<(f64, f64)>;

    /// Block-level text boxes in reading order.
    fn text_blocks(&self, page: u32) -> Result<Vec<TextBlock>>;

    /// Word-level text boxes in extraction order.
    fn words(&self, page: u32) -> Result<Vec<Word>>;

    /// Draw a PNG image into `rect` on `page`.
    fn composite_image(
        &mut self,
        page: u32,
        rect: &Rect,
        png: &[u8],
        mode: CompositeMode,
    ) -> Result<()>;

    /// Persist the document.
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Everything the detectors need about one page.
    fn page_layout(&self, page: u32) -> Result<PageLayout> {
        let (width, height) = self.page_size(page)?;
        Ok(PageLayout {
            width,
            height,
            blocks: self.text_blocks(page)?,
            words: self.words(page)?,
        })
    }
}

/// Visible page area in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    /// Fallback when neither the page nor its ancestors carry a box (A4).
    pub const DEFAULT: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 595.0,
        ury: 842.0,
    };

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    /// PDF user space to page space.
    pub fn to_page(&self, p: Point) -> Point {
        Point::new(p.x - self.llx, self.ury - p.y)
    }

    /// Page-space rectangle to PDF user space `(x, y, width, height)` with
    /// `(x, y)` the lower-left corner.
    pub fn to_user_space(&self, rect: &Rect) -> (f64, f64, f64, f64) {
        (
            rect.x0 + self.llx,
            self.ury - rect.y1,
            rect.width(),
            rect.height(),
        )
    }
}

/// A PDF document loaded with `lopdf`.
pub struct LopdfDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    images_added: usize,
}

impl LopdfDocument {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = Document::load(path.as_ref()).map_err(|e| {
            StampError::Pdf(format!("cannot open {}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self::from_document(doc))
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_document(Document::load_mem(bytes)?))
    }

    pub fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages();
        Self {
            doc,
            pages,
            images_added: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Serialize the document into memory.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or_else(|| StampError::Pdf(format!("page {} does not exist", page)))
    }

    fn page_box(&self, page: u32) -> Result<PageBox> {
        let id = self.page_id(page)?;
        Ok(effective_page_box(&self.doc, id))
    }
}

impl DocumentProvider for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<(f64, f64)> {
        let b = self.page_box(page)?;
        Ok((b.width(), b.height()))
    }

    fn text_blocks(&self, page: u32) -> Result<Vec<TextBlock>> {
        let words = extract::page_words(&self.doc, self.page_id(page)?, &self.page_box(page)?)?;
        Ok(extract::group_blocks(&words))
    }

    fn words(&self, page: u32) -> Result<Vec<Word>> {
        let words = extract::page_words(&self.doc, self.page_id(page)?, &self.page_box(page)?)?;
        Ok(words.into_iter().map(|w| Word::new(w.rect, &w.text)).collect())
    }

    fn page_layout(&self, page: u32) -> Result<PageLayout> {
        let page_box = self.page_box(page)?;
        let raw = extract::page_words(&self.doc, self.page_id(page)?, &page_box)?;
        Ok(PageLayout {
            width: page_box.width(),
            height: page_box.height(),
            blocks: extract::group_blocks(&raw),
            words: raw.into_iter().map(|w| Word::new(w.rect, &w.text)).collect(),
        })
    }

    fn composite_image(
        &mut self,
        page: u32,
        rect: &Rect,
        png: &[u8],
        mode: CompositeMode,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let page_box = self.page_box(page)?;
        self.images_added += 1;
        let name = format!("PaidStamp{}", self.images_added);
        composite::overlay_png(&mut self.doc, page_id, &page_box, rect, png, &name, mode)
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.doc.save_to(&mut file)?;
        file.flush()?;
        tracing::debug!(path = %path.display(), images = self.images_added, "document written");
        Ok(())
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn as_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Follow a reference, if `obj` is one.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Dictionary value of `obj`, following one reference.
pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj)?.as_dict().ok()
}

/// Look `key` up on the page and then up the `Parent` chain.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    // guard against Parent cycles in broken files
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn parse_box(doc: &Document, obj: &Object) -> Option<PageBox> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let v: Vec<f64> = arr.iter().filter_map(as_f64).collect();
    if v.len() != 4 {
        return None;
    }
    let b = PageBox {
        llx: v[0].min(v[2]),
        lly: v[1].min(v[3]),
        urx: v[0].max(v[2]),
        ury: v[1].max(v[3]),
    };
    (b.width() > 0.0 && b.height() > 0.0).then_some(b)
}

/// CropBox if present, else MediaBox, else the default page size.
pub(crate) fn effective_page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    inherited(doc, page_id, b"CropBox")
        .and_then(|o| parse_box(doc, o))
        .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(|o| parse_box(doc, o)))
        .unwrap_or_else(|| {
            tracing::debug!(?page_id, "page has no usable box, assuming A4");
            PageBox::DEFAULT
        })
}
