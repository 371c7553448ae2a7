//! images-to-pdf: one centred image per page.
//!
//! Pages have a fixed size and a margin on every side. Images that fit in the
//! usable area are drawn at native size (one pixel per point); larger ones
//! are scaled down, preserving aspect ratio. Every image is flattened to RGB
//! and embedded as a Flate-compressed `DeviceRGB` image XObject.

use crate::error::ConvertError;
use crate::pipeline::raster;
use crate::pipeline::workspace::StagedInput;
use crate::progress::InputProgress;
use lopdf::content::{Content, Operation as PdfOp};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::debug;

/// Where an image lands on a page, in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Compute the drawn size and centred position of an image.
///
/// Oversized images are constrained by width when landscape
/// (`width / height > 1`) and by height otherwise. The other axis is then
/// clamped as well, so a square image on a portrait page still respects the
/// side margins.
pub fn place(img_width: u32, img_height: u32, page: (f32, f32), margin: f32) -> Placement {
    let (page_w, page_h) = page;
    let max_w = page_w - 2.0 * margin;
    let max_h = page_h - 2.0 * margin;

    let w = img_width as f32;
    let h = img_height as f32;
    let aspect = w / h;

    let (mut draw_w, mut draw_h) = if w > max_w || h > max_h {
        if aspect > 1.0 {
            let dw = w.min(max_w);
            (dw, dw / aspect)
        } else {
            let dh = h.min(max_h);
            (dh * aspect, dh)
        }
    } else {
        (w, h)
    };

    if draw_w > max_w {
        draw_h *= max_w / draw_w;
        draw_w = max_w;
    }
    if draw_h > max_h {
        draw_w *= max_h / draw_h;
        draw_h = max_h;
    }

    Placement {
        x: (page_w - draw_w) / 2.0,
        y: (page_h - draw_h) / 2.0,
        width: draw_w,
        height: draw_h,
    }
}

/// Compose `inputs` into a PDF at `output`, one page per image, in order.
pub fn images_to_pdf(
    inputs: &[StagedInput],
    output: &Path,
    page: (f32, f32),
    margin: f32,
    progress: &InputProgress,
) -> Result<(), ConvertError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(inputs.len());

    for (idx, input) in inputs.iter().enumerate() {
        progress.start(idx, &input.name);
        let rgb = raster::to_rgb(raster::decode(&input.path, &input.name)?);
        let placement = place(rgb.width(), rgb.height(), page, margin);
        debug!(
            "Page {}: '{}' {}x{} px → {:.1}x{:.1} pt at ({:.1}, {:.1})",
            idx + 1,
            input.name,
            rgb.width(),
            rgb.height(),
            placement.width,
            placement.height,
            placement.x,
            placement.y
        );

        let mut image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(rgb.width()),
                "Height" => i64::from(rgb.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
            },
            rgb.into_raw(),
        );
        image
            .compress()
            .map_err(|e| ConvertError::Encode(format!("image stream: {e}")))?;
        let image_id = doc.add_object(image);
        let page_id = add_image_page(&mut doc, pages_id, image_id, placement, page)?;
        kids.push(page_id.into());
        progress.complete(idx);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(output)
        .map_err(|e| ConvertError::Encode(format!("PDF write failed: {e}")))?;
    Ok(())
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image_id: ObjectId,
    placement: Placement,
    page: (f32, f32),
) -> Result<ObjectId, ConvertError> {
    let content = Content {
        operations: vec![
            PdfOp::new("q", vec![]),
            PdfOp::new(
                "cm",
                vec![
                    placement.width.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    placement.height.into(),
                    placement.x.into(),
                    placement.y.into(),
                ],
            ),
            PdfOp::new("Do", vec!["Im0".into()]),
            PdfOp::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| ConvertError::Encode(format!("content stream: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::from(page.0),
            Object::from(page.1),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const LETTER: (f32, f32) = (612.0, 792.0);

    #[test]
    fn landscape_image_is_width_constrained_and_centred() {
        let p = place(4000, 2000, LETTER, 72.0);
        assert_eq!(
            p,
            Placement {
                x: 72.0,
                y: 279.0,
                width: 468.0,
                height: 234.0
            }
        );
    }

    #[test]
    fn small_image_keeps_native_size() {
        let p = place(200, 100, LETTER, 72.0);
        assert_eq!((p.width, p.height), (200.0, 100.0));
        assert_eq!((p.x, p.y), (206.0, 346.0));
    }

    #[test]
    fn portrait_image_is_height_constrained() {
        let p = place(1000, 3000, LETTER, 72.0);
        assert_eq!(p.height, 648.0);
        assert!((p.width - 216.0).abs() < 1e-3);
        assert_eq!(p.y, 72.0);
    }

    #[test]
    fn square_image_never_crosses_side_margins() {
        let p = place(1000, 1000, LETTER, 72.0);
        assert!((p.width - 468.0).abs() < 1e-3);
        assert!((p.height - 468.0).abs() < 1e-3);
        assert!(p.x >= 72.0 - 1e-3 && p.x + p.width <= 540.0 + 1e-3);
        assert!(p.y >= 72.0 - 1e-3 && p.y + p.height <= 720.0 + 1e-3);
    }

    #[test]
    fn composed_pdf_has_one_page_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = Vec::new();
        for (i, (w, h)) in [(50, 40), (900, 300), (30, 700)].into_iter().enumerate() {
            let path = dir.path().join(format!("input-{i}.png"));
            RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, 100]))
                .save(&path)
                .unwrap();
            staged.push(StagedInput {
                name: format!("img{i}.png"),
                path,
            });
        }
        let output = dir.path().join("output.pdf");

        images_to_pdf(&staged, &output, LETTER, 72.0, &InputProgress::default()).unwrap();

        let doc = Document::load(&output).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);
        for page_id in pages.values() {
            let content = doc.get_page_content(*page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            assert!(text.contains("/Im0 Do"), "content: {text}");
        }
    }

    #[test]
    fn undecodable_image_fails_the_whole_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input-0.png");
        std::fs::write(&path, b"nope").unwrap();
        let output = dir.path().join("output.pdf");

        let err = images_to_pdf(
            &[StagedInput {
                name: "broken.png".into(),
                path,
            }],
            &output,
            LETTER,
            72.0,
            &InputProgress::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::ImageDecode { .. }));
        assert!(!output.exists());
    }
}
