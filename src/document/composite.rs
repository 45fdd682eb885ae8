//! Drawing a PNG stamp onto a PDF page.
//!
//! The PNG is split into an RGB image XObject and a DeviceGray soft mask,
//! both Flate-compressed. The page's existing content is wrapped in `q`/`Q`
//! so any state it leaves behind cannot leak into the stamp, and a final
//! content stream places the image with a `cm` + `Do` pair.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageFormat;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

use super::{inherited, resolve_dict, CompositeMode, PageBox};
use crate::error::{Result, StampError};
use crate::geometry::Rect;

fn flate_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Largest rectangle with the image's aspect ratio centered inside `target`.
pub fn fit_rect(target: &Rect, pixel_width: u32, pixel_height: u32) -> Rect {
    if pixel_width == 0 || pixel_height == 0 || target.is_empty() {
        return *target;
    }
    let scale = (target.width() / pixel_width as f64).min(target.height() / pixel_height as f64);
    let w = pixel_width as f64 * scale;
    let h = pixel_height as f64 * scale;
    Rect::centered_at(target.point_at(0.5, 0.5), w, h)
}

/// Add the image and its soft mask to the document, returning the image id.
fn add_image_xobject(doc: &mut Document, png: &[u8]) -> Result<(ObjectId, u32, u32)> {
    let img = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgba8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(StampError::Render("stamp image is empty".to_string()));
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in img.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
    }

    let smask = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        flate_compress(&alpha)?,
    );
    let smask_id = doc.add_object(smask);

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => smask_id,
        },
        flate_compress(&rgb)?,
    );
    Ok((doc.add_object(image), width, height))
}

/// Register `image_id` under `name` in the page's XObject resources.
///
/// Inherited resources are copied onto the page first so the page keeps
/// seeing its fonts; shared resource dictionaries are updated in place.
fn register_xobject(doc: &mut Document, page_id: ObjectId, name: &str, image_id: ObjectId) -> Result<()> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let (shared_id, mut resources) = match page.get(b"Resources").ok() {
        Some(Object::Reference(id)) => (Some(*id), doc.get_object(*id)?.as_dict()?.clone()),
        Some(Object::Dictionary(dict)) => (None, dict.clone()),
        _ => (
            None,
            inherited(doc, page_id, b"Resources")
                .and_then(|o| resolve_dict(doc, o))
                .cloned()
                .unwrap_or_default(),
        ),
    };

    let mut xobjects: Dictionary = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
        .unwrap_or_default();
    xobjects.set(name, Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    match shared_id {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(resources));
        }
        None => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", Object::Dictionary(resources));
        }
    }
    Ok(())
}

/// References to the page's current content streams, in order.
fn content_refs(doc: &mut Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let contents = doc
        .get_object(page_id)?
        .as_dict()?
        .get(b"Contents")
        .ok()
        .cloned();

    Ok(match contents {
        Some(Object::Reference(id)) => vec![Object::Reference(id)],
        Some(Object::Array(items)) => items,
        Some(Object::Stream(stream)) => vec![Object::Reference(doc.add_object(stream))],
        _ => Vec::new(),
    })
}

/// Draw `png` into the page-space `rect` of a page.
pub fn overlay_png(
    doc: &mut Document,
    page_id: ObjectId,
    page_box: &PageBox,
    rect: &Rect,
    png: &[u8],
    name: &str,
    mode: CompositeMode,
) -> Result<()> {
    let (image_id, width, height) = add_image_xobject(doc, png)?;
    register_xobject(doc, page_id, name, image_id)?;

    let target = if mode.keep_proportion {
        fit_rect(rect, width, height)
    } else {
        *rect
    };
    let (x, y, w, h) = page_box.to_user_space(&target);
    let draw = format!("q {:.4} 0 0 {:.4} {:.4} {:.4} cm /{} Do Q\n", w, h, x, y, name);

    let existing = content_refs(doc, page_id)?;
    let mut contents = Vec::with_capacity(existing.len() + 2);
    if existing.is_empty() {
        contents.push(Object::Reference(
            doc.add_object(Stream::new(dictionary! {}, draw.into_bytes())),
        ));
    } else if mode.overlay {
        let open = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let close = doc.add_object(Stream::new(
            dictionary! {},
            format!("Q\n{}", draw).into_bytes(),
        ));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
    } else {
        let under = doc.add_object(Stream::new(dictionary! {}, draw.into_bytes()));
        contents.push(Object::Reference(under));
        contents.extend(existing);
    }

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));

    tracing::debug!(
        ?page_id,
        x,
        y,
        width = w,
        height = h,
        pixels = width * height,
        "stamp image placed"
    );
    Ok(())
}
