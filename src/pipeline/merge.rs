//! merge-pdfs: concatenate documents, preserving input and page order.
//!
//! Each source document is renumbered into its own id range so objects never
//! collide, then its pages are re-parented under a single new page tree.
//! Attributes a page inherits from its old tree (`Resources`, `MediaBox`,
//! `CropBox`, `Rotate`) are copied onto the page first, because the old
//! `Pages` nodes are dropped. Anything no longer reachable from the new
//! catalog (old outlines, forms, object streams) is pruned before saving.

use crate::error::ConvertError;
use crate::pipeline::workspace::StagedInput;
use crate::progress::InputProgress;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::path::Path;
use tracing::{debug, info};

/// Page attributes that may be inherited from ancestor `Pages` nodes.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Merge `inputs` into one PDF at `output`. Returns the merged page count.
pub fn merge_pdfs(
    inputs: &[StagedInput],
    output: &Path,
    progress: &InputProgress,
) -> Result<usize, ConvertError> {
    let mut merged = Document::with_version("1.5");
    let mut next_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for (idx, input) in inputs.iter().enumerate() {
        progress.start(idx, &input.name);
        let mut doc = load(input)?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        // get_pages() is keyed by page number, so this is reading order.
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(ConvertError::CorruptPdf {
                name: input.name.clone(),
                detail: "document has no pages".into(),
            });
        }
        for &page_id in &pages {
            flatten_inherited(&mut doc, page_id);
        }

        for (id, object) in doc.objects {
            if matches!(type_name(&object), Some(b"Catalog") | Some(b"Pages")) {
                continue;
            }
            merged.objects.insert(id, object);
        }
        debug!("'{}': {} pages", input.name, pages.len());
        page_ids.extend(pages);
        progress.complete(idx);
    }

    merged.max_id = next_id - 1;
    let pages_id = merged.new_object_id();
    for &page_id in &page_ids {
        if let Ok(page) = merged.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.set("Parent", pages_id);
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    let pruned = merged.prune_objects();
    debug!("Pruned {} unreachable objects", pruned.len());

    merged
        .save(output)
        .map_err(|e| ConvertError::Encode(format!("PDF write failed: {e}")))?;
    info!(
        "Merged {} documents into {} pages",
        inputs.len(),
        page_ids.len()
    );
    Ok(page_ids.len())
}

fn load(input: &StagedInput) -> Result<Document, ConvertError> {
    let doc = Document::load(&input.path).map_err(|e| ConvertError::CorruptPdf {
        name: input.name.clone(),
        detail: e.to_string(),
    })?;
    if doc.is_encrypted() {
        return Err(ConvertError::EncryptedPdf {
            name: input.name.clone(),
        });
    }
    Ok(doc)
}

/// The `/Type` name of a dictionary object.
fn type_name(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

/// Copy inheritable attributes from the page's ancestors onto the page.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) {
    let mut missing: Vec<(&[u8], Object)> = Vec::new();
    if let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) {
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited_value(doc, page, key) {
                missing.push((key, value));
            }
        }
    }
    if missing.is_empty() {
        return;
    }
    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        for (key, value) in missing {
            page.set(key, value);
        }
    }
}

fn inherited_value(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_object(parent?).and_then(Object::as_dict).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation as PdfOp};
    use lopdf::Stream;
    use std::path::PathBuf;

    /// A PDF whose pages each draw `"{label}-page-{n}"`, with `Resources` and
    /// `MediaBox` only on the page-tree root.
    fn fixture_pdf(dir: &Path, label: &str, pages: usize) -> StagedInput {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut kids: Vec<Object> = Vec::new();
        for n in 1..=pages {
            let content = Content {
                operations: vec![
                    PdfOp::new("BT", vec![]),
                    PdfOp::new("Tf", vec!["F1".into(), Object::Integer(24)]),
                    PdfOp::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                    PdfOp::new(
                        "Tj",
                        vec![Object::string_literal(format!("{label}-page-{n}"))],
                    ),
                    PdfOp::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join(format!("{label}.pdf"));
        doc.save(&path).unwrap();
        StagedInput {
            name: format!("{label}.pdf"),
            path,
        }
    }

    fn page_texts(path: &PathBuf) -> Vec<String> {
        let doc = Document::load(path).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn three_plus_two_pages_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = fixture_pdf(dir.path(), "a", 3);
        let b = fixture_pdf(dir.path(), "b", 2);
        let output = dir.path().join("output.pdf");

        let count = merge_pdfs(&[a, b], &output, &InputProgress::default()).unwrap();
        assert_eq!(count, 5);

        let texts = page_texts(&output);
        let expected = ["a-page-1", "a-page-2", "a-page-3", "b-page-1", "b-page-2"];
        assert_eq!(texts.len(), expected.len());
        for (text, marker) in texts.iter().zip(expected) {
            assert!(text.contains(marker), "expected {marker} in {text}");
        }
    }

    #[test]
    fn input_order_wins_over_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let z = fixture_pdf(dir.path(), "z", 1);
        let a = fixture_pdf(dir.path(), "a", 1);
        let output = dir.path().join("output.pdf");

        merge_pdfs(&[z, a], &output, &InputProgress::default()).unwrap();

        let texts = page_texts(&output);
        assert!(texts[0].contains("z-page-1"));
        assert!(texts[1].contains("a-page-1"));
    }

    #[test]
    fn inherited_attributes_are_copied_onto_pages() {
        let dir = tempfile::tempdir().unwrap();
        let a = fixture_pdf(dir.path(), "a", 2);
        let output = dir.path().join("output.pdf");

        merge_pdfs(&[a], &output, &InputProgress::default()).unwrap();

        let doc = Document::load(&output).unwrap();
        for &id in doc.get_pages().values() {
            let page = doc.get_object(id).and_then(Object::as_dict).unwrap();
            assert!(page.has(b"MediaBox"));
            assert!(page.has(b"Resources"));
        }
    }

    #[test]
    fn corrupt_pdf_is_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let good = fixture_pdf(dir.path(), "good", 1);
        let bad_path = dir.path().join("bad.pdf");
        std::fs::write(&bad_path, b"%PDF-1.4\nthis is not a real pdf").unwrap();
        let bad = StagedInput {
            name: "bad.pdf".into(),
            path: bad_path,
        };
        let output = dir.path().join("output.pdf");

        let err = merge_pdfs(&[good, bad], &output, &InputProgress::default()).unwrap_err();
        match err {
            ConvertError::CorruptPdf { name, .. } => assert_eq!(name, "bad.pdf"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
    }
}
