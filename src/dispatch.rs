//! Conversion entry points.
//!
//! [`dispatch`] is the single routing point: it materialises the request's
//! inputs in a private workspace, hands them to the pipeline stage for the
//! operation, and reads the produced file back. The workspace is dropped
//! before `dispatch` returns, so no temporary file outlives the request.
//!
//! Codec work (image, PDF, DOCX) runs in `spawn_blocking`; external
//! converters are awaited as child processes.

use crate::config::{ConversionConfig, WordBackend};
use crate::error::ConvertError;
use crate::operation::Operation;
use crate::output::ConversionOutput;
use crate::pipeline::workspace::{ensure_pdf, StagedInput, Workspace};
use crate::pipeline::{audio, compose, docx, icon, merge, office, pdfium, raster};
use crate::progress::InputProgress;
use crate::request::{ConversionRequest, InputFile};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Run one conversion request.
///
/// # Errors
/// Every failure of the underlying codec, PDF library or external tool is
/// reported as a [`ConvertError`]; there is never partial output.
///
/// # Example
/// ```rust,no_run
/// use convertkit::{dispatch, ConversionConfig, ConversionRequest, InputFile, Operation};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let photo = InputFile::new("photo.jpg", std::fs::read("photo.jpg")?);
/// let request = ConversionRequest::new(Operation::JpgToPng, vec![photo])?;
/// let output = dispatch(&request, &ConversionConfig::default()).await?;
/// assert_eq!(output.filename, "photo.png");
/// # Ok(())
/// # }
/// ```
pub async fn dispatch(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let operation = request.operation();
    let total = request.inputs().len();
    let start = Instant::now();
    info!("Starting {} with {} input(s)", operation, total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(operation, total);
    }

    let result = run(request, config).await;

    match &result {
        Ok(output) => {
            info!(
                "{} produced '{}' ({} bytes) in {}ms",
                operation,
                output.filename,
                output.bytes.len(),
                start.elapsed().as_millis()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_conversion_complete(operation, output.bytes.len());
            }
        }
        Err(e) => {
            warn!("{} failed ({:?}): {}", operation, e.kind(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_conversion_error(operation, e.to_string());
            }
        }
    }
    result
}

/// Synchronous wrapper around [`dispatch`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn dispatch_sync(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(dispatch(request, config))
}

/// Read `paths` from disk and convert them with `operation`.
///
/// Input names are the paths' file names, so the suggested output filename
/// follows the first file.
pub async fn convert_files(
    operation: Operation,
    paths: &[PathBuf],
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let input = InputFile::from_path(path)
            .await
            .map_err(|e| ConvertError::InputReadFailed {
                path: path.clone(),
                source: e,
            })?;
        inputs.push(input);
    }
    let request = ConversionRequest::new(operation, inputs)?;
    dispatch(&request, config).await
}

/// Write a conversion result to `path`.
///
/// The bytes go to a uniquely-named temp file beside `path`, which is then
/// renamed over it. A failed write never leaves a truncated file at `path`,
/// and concurrent writers to the same destination never share a temp file.
pub async fn write_output(output: &ConversionOutput, path: impl AsRef<Path>) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let write_failed = |source| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;

    // The TempPath removes the file on drop unless it is persisted.
    let (file, tmp_path) = tempfile::Builder::new()
        .prefix(".convertkit-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_failed)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);
    file.write_all(&output.bytes).await.map_err(write_failed)?;
    file.sync_all().await.map_err(write_failed)?;
    drop(file);

    tmp_path.persist(path).map_err(|e| write_failed(e.error))?;
    debug!("Wrote {} bytes to {}", output.bytes.len(), path.display());
    Ok(())
}

// ── Routing ──────────────────────────────────────────────────────────────

async fn run(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let operation = request.operation();
    config.validate()?;

    if operation.takes_pdf() {
        for input in request.inputs() {
            ensure_pdf(input)?;
        }
    }

    // Dropped at the end of this function, on every path.
    let workspace = Workspace::create(config.temp_root.as_deref())?;
    let staged = workspace.stage_inputs(request.inputs()).await?;
    let progress = InputProgress::new(config.progress_callback.clone(), staged.len());
    let output_path = workspace.output_path(operation.output_extension());

    let (produced, producer) = match operation {
        Operation::MergePdfs => {
            let (inputs, out, progress) = (staged.clone(), output_path.clone(), progress.clone());
            let pages = blocking("Merge", move || merge::merge_pdfs(&inputs, &out, &progress)).await?;
            debug!("Merged document has {} pages", pages);
            (output_path, "PDF merger")
        }
        Operation::ImagesToPdf => {
            let (inputs, out, progress) = (staged.clone(), output_path.clone(), progress.clone());
            let page = config.page_size.dimensions_pt();
            let margin = config.margin_pt;
            blocking("Compose", move || {
                compose::images_to_pdf(&inputs, &out, page, margin, &progress)
            })
            .await?;
            (output_path, "PDF composer")
        }
        single => {
            let input = first(&staged)?;
            progress.start(0, &input.name);
            let produced = run_single(single, &input, &output_path, workspace.path(), config).await?;
            progress.complete(0);
            produced
        }
    };

    let bytes = workspace.read_output(&produced, producer).await?;
    Ok(ConversionOutput {
        bytes,
        filename: request.suggested_filename(),
        mime_type: operation.mime_type().to_string(),
    })
}

/// Route a single-input operation. Returns the produced file and the name of
/// whatever produced it.
async fn run_single(
    operation: Operation,
    input: &StagedInput,
    output_path: &Path,
    workdir: &Path,
    config: &ConversionConfig,
) -> Result<(PathBuf, &'static str), ConvertError> {
    let (path, name, out) = (
        input.path.clone(),
        input.name.clone(),
        output_path.to_path_buf(),
    );
    match operation {
        Operation::ImageToIcon => {
            let sizes = config.icon_sizes.clone();
            blocking("Icon", move || icon::image_to_icon(&path, &name, &out, &sizes)).await?;
            Ok((output_path.to_path_buf(), "ICO encoder"))
        }
        Operation::JpgToPng => {
            blocking("PNG", move || raster::jpg_to_png(&path, &name, &out)).await?;
            Ok((output_path.to_path_buf(), "PNG encoder"))
        }
        Operation::PdfToWord => match config.word_backend {
            WordBackend::Office => Ok((office::pdf_to_docx(input, workdir, config).await?, "soffice")),
            WordBackend::Text => text_docx(path, name, out, config).await,
            WordBackend::Auto => match office::pdf_to_docx(input, workdir, config).await {
                Ok(produced) => Ok((produced, "soffice")),
                Err(ConvertError::MissingDependency { .. }) => {
                    warn!(
                        "LibreOffice not available; '{}' converted as text only (no images or layout)",
                        input.name
                    );
                    text_docx(path, name, out, config).await
                }
                Err(e) => Err(e),
            },
        },
        Operation::SlidesToPdf => {
            let produced = office::slides_to_pdf(input, workdir, config).await?;
            Ok((produced, "soffice"))
        }
        Operation::VideoToAudio => {
            audio::video_to_audio(input, output_path, config).await?;
            Ok((output_path.to_path_buf(), "ffmpeg"))
        }
        Operation::MergePdfs | Operation::ImagesToPdf => Err(ConvertError::Internal(format!(
            "{operation} is not a single-input operation"
        ))),
    }
}

/// pdf-to-word without an office suite: pdfium text, one paragraph per line.
async fn text_docx(
    path: PathBuf,
    name: String,
    out: PathBuf,
    config: &ConversionConfig,
) -> Result<(PathBuf, &'static str), ConvertError> {
    let lib = config.pdfium_lib_path.clone();
    let produced = out.clone();
    blocking("Text extraction", move || {
        let pages = pdfium::extract_page_text(&path, &name, lib.as_deref())?;
        docx::write_docx(&pages, &out)
    })
    .await?;
    Ok((produced, "DOCX writer"))
}

fn first(staged: &[StagedInput]) -> Result<StagedInput, ConvertError> {
    staged
        .first()
        .cloned()
        .ok_or_else(|| ConvertError::Internal("request has no staged inputs".into()))
}

/// Run CPU-bound codec work off the async executor.
async fn blocking<T, F>(stage: &'static str, work: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ConvertError::Internal(format!("{} task panicked: {}", stage, e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &Path) -> ConversionConfig {
        ConversionConfig::builder().temp_root(root).build().unwrap()
    }

    #[tokio::test]
    async fn write_output_is_atomic_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        let output = ConversionOutput {
            bytes: b"data".to_vec(),
            filename: "out.png".into(),
            mime_type: "image/png".into(),
        };

        write_output(&output, &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        let entries = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(entries, 1, "temp file left beside the output");
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_destination_both_land_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let output = |byte: u8| ConversionOutput {
            bytes: vec![byte; 256 * 1024],
            filename: "out.bin".into(),
            mime_type: "application/octet-stream".into(),
        };
        let (a, b) = (output(b'a'), output(b'b'));

        let (ra, rb) = tokio::join!(write_output(&a, &path), write_output(&b, &path));
        ra.unwrap();
        rb.unwrap();

        let written = std::fs::read(&path).unwrap();
        assert!(written == a.bytes || written == b.bytes, "interleaved output");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn config_edited_after_build_is_rechecked() {
        let root = tempfile::tempdir().unwrap();
        let config = ConversionConfig {
            icon_sizes: vec![0, 16],
            ..config_in(root.path())
        };
        let request = ConversionRequest::new(
            Operation::ImageToIcon,
            vec![InputFile::new("logo.png", b"irrelevant".to_vec())],
        )
        .unwrap();

        let err = dispatch(&request, &config).await.unwrap_err();

        assert!(matches!(err, ConvertError::InvalidConfig(_)), "got {err}");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn word_without_office_falls_back_to_text_extraction() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let request = ConversionRequest::new(
            Operation::PdfToWord,
            vec![InputFile::new("report.pdf", b"%PDF-1.5\n".to_vec())],
        )
        .unwrap();
        let with = |backend| {
            ConversionConfig::builder()
                .temp_root(root.path())
                .word_backend(backend)
                .soffice_path(missing.join("soffice"))
                .pdfium_lib_path(missing.join("libpdfium.so"))
                .build()
                .unwrap()
        };

        // Auto skips the absent office suite and reaches pdfium.
        let err = dispatch(&request, &with(WordBackend::Auto)).await.unwrap_err();
        assert!(matches!(err, ConvertError::PdfiumBindingFailed(_)), "got {err}");

        let err = dispatch(&request, &with(WordBackend::Office)).await.unwrap_err();
        assert!(matches!(err, ConvertError::MissingDependency { .. }), "got {err}");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_rejected_before_staging() {
        let root = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .temp_root(root.path())
            .build()
            .unwrap();
        let request = ConversionRequest::new(
            Operation::MergePdfs,
            vec![InputFile::new("a.pdf", b"PK\x03\x04zip".to_vec())],
        )
        .unwrap();

        let err = dispatch(&request, &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::NotAPdf { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_input_file_is_an_input_error() {
        let err = convert_files(
            Operation::JpgToPng,
            &[PathBuf::from("/no/such/photo.jpg")],
            &ConversionConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConvertError::InputReadFailed { .. }));
        assert_eq!(err.kind(), crate::error::FailureKind::Input);
    }

    #[test]
    fn dispatch_sync_runs_without_a_runtime() {
        let root = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .temp_root(root.path())
            .build()
            .unwrap();
        let request = ConversionRequest::new(
            Operation::JpgToPng,
            vec![InputFile::new("x.jpg", b"not an image".to_vec())],
        )
        .unwrap();

        let err = dispatch_sync(&request, &config).unwrap_err();
        assert!(matches!(err, ConvertError::ImageDecode { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
