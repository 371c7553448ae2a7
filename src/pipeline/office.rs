//! Conversions delegated to a headless LibreOffice: slides-to-pdf and the
//! layout-preserving pdf-to-word path.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::process::{self, SOFFICE};
use crate::pipeline::workspace::StagedInput;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One `soffice --convert-to` recipe.
#[derive(Debug, Clone, Copy)]
struct Export {
    /// Import filter forced with `--infilter`, when the default would pick
    /// the wrong application.
    infilter: Option<&'static str>,
    /// Argument to `--convert-to`: extension plus optional export filter.
    convert_to: &'static str,
    /// Extension soffice gives the produced file.
    extension: &'static str,
}

/// Presentations (ppt, pptx, odp) to PDF with Impress's default export.
const SLIDES_TO_PDF: Export = Export {
    infilter: None,
    convert_to: "pdf",
    extension: "pdf",
};

/// PDF opened by Writer's PDF import (positioned frames, embedded images)
/// and saved as Office Open XML.
const PDF_TO_DOCX: Export = Export {
    infilter: Some("writer_pdf_import"),
    convert_to: "docx:MS Word 2007 XML",
    extension: "docx",
};

/// Convert a presentation to PDF inside `workdir`, returning the PDF's path.
pub async fn slides_to_pdf(
    input: &StagedInput,
    workdir: &Path,
    config: &ConversionConfig,
) -> Result<PathBuf, ConvertError> {
    convert(input, workdir, config, SLIDES_TO_PDF).await
}

/// Convert a PDF to DOCX inside `workdir`, keeping page layout and images.
pub async fn pdf_to_docx(
    input: &StagedInput,
    workdir: &Path,
    config: &ConversionConfig,
) -> Result<PathBuf, ConvertError> {
    convert(input, workdir, config, PDF_TO_DOCX).await
}

/// soffice names its output after the input stem, so `input-0.pptx` becomes
/// `input-0.pdf` in `workdir`. Each run gets a private user profile: two
/// soffice processes sharing one profile block each other on its lock.
async fn convert(
    input: &StagedInput,
    workdir: &Path,
    config: &ConversionConfig,
    export: Export,
) -> Result<PathBuf, ConvertError> {
    let soffice = process::locate(&SOFFICE, config.soffice_path.as_deref())?;
    let args = soffice_args(&input.path, workdir, export);

    info!(
        "Converting '{}' to {} with {}",
        input.name,
        export.extension,
        soffice.display()
    );
    let output = process::run(&SOFFICE, &soffice, args, config.process_timeout_secs).await?;

    // soffice exits 0 even when it cannot load the source; the only signal
    // is a missing result and a message on stderr.
    let produced = expected_output(&input.path, workdir, export.extension);
    let written = tokio::fs::metadata(&produced)
        .await
        .map(|meta| meta.len() > 0)
        .unwrap_or(false);
    if !written {
        let said = process::diagnostics(&output);
        warn!("soffice produced no {} for '{}'", export.extension, input.name);
        return Err(ConvertError::ProcessFailed {
            tool: SOFFICE.name.to_string(),
            code: output.status.code(),
            stderr: if said.is_empty() {
                format!("no {} was produced from '{}'", export.extension, input.name)
            } else {
                said
            },
        });
    }
    Ok(produced)
}

fn soffice_args(input: &Path, workdir: &Path, export: Export) -> Vec<OsString> {
    let profile = workdir.join("soffice-profile");
    let mut user_installation = OsString::from("-env:UserInstallation=file://");
    user_installation.push(profile.as_os_str());

    let mut args = vec![
        user_installation,
        "--headless".into(),
        "--norestore".into(),
    ];
    if let Some(filter) = export.infilter {
        args.push(format!("--infilter={filter}").into());
    }
    args.extend([
        "--convert-to".into(),
        export.convert_to.into(),
        "--outdir".into(),
        workdir.as_os_str().to_owned(),
        input.as_os_str().to_owned(),
    ]);
    args
}

fn expected_output(input: &Path, workdir: &Path, extension: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = stem.to_owned();
    name.push(".");
    name.push(extension);
    workdir.join(name)
}
