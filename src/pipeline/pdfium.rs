//! Text extraction through pdfium, for pdf-to-word.
//!
//! pdfium is bound at runtime, never linked: the library is looked up at
//! `ConversionConfig::pdfium_lib_path` (a file, or a directory holding the
//! platform library) and otherwise on the system library path. A missing
//! library is an environment failure, not an input failure.
//!
//! pdfium keeps process-global state and is not async-safe; callers run
//! [`extract_page_text`] inside `spawn_blocking`.

use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to pdfium, preferring an explicit library location.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let bindings = match lib_path {
        Some(path) => {
            let library = resolve_library(path);
            debug!("Binding pdfium at {}", library.display());
            Pdfium::bind_to_library(&library)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

/// A directory means "the platform library inside it".
fn resolve_library(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{DLL_PREFIX}pdfium{DLL_SUFFIX}"))
    } else {
        path.to_path_buf()
    }
}

/// Extract the text of every page, in page order.
///
/// Pages without a text layer (scans) come back as empty strings.
pub fn extract_page_text(
    pdf_path: &Path,
    name: &str,
    lib_path: Option<&Path>,
) -> Result<Vec<String>, ConvertError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let detail = format!("{:?}", e);
        if detail.contains("Password") || detail.contains("password") {
            ConvertError::EncryptedPdf {
                name: name.to_string(),
            }
        } else {
            ConvertError::CorruptPdf {
                name: name.to_string(),
                detail,
            }
        }
    })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("'{}' loaded: {} pages", name, total);

    let mut texts = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| ConvertError::CorruptPdf {
                name: name.to_string(),
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();
        debug!("Page {}: {} chars", idx + 1, text.chars().count());
        texts.push(text);
    }
    Ok(texts)
}
