//! # convertkit
//!
//! Convert files between common document, image and media formats.
//!
//! A request names one [`Operation`] and carries one or more named input
//! files. The dispatcher writes them into a private temporary workspace,
//! hands them to the capability for that operation, and returns the produced
//! file in memory together with a suggested filename and MIME type. The
//! workspace is removed before the call returns, whatever the outcome.
//!
//! ## Operations
//!
//! | Operation | Inputs | Output | Backend |
//! |-----------|--------|--------|---------|
//! | `image-to-icon`  | 1 image   | `.ico` (16–128 px frames) | `image` |
//! | `pdf-to-word`    | 1 PDF     | `.docx`                   | LibreOffice, or pdfium + `zip` (text only) |
//! | `merge-pdfs`     | 1+ PDFs   | `.pdf`                    | `lopdf` |
//! | `images-to-pdf`  | 1+ images | `.pdf`, one page each     | `image` + `lopdf` |
//! | `jpg-to-png`     | 1 image   | `.png` (RGB)              | `image` |
//! | `slides-to-pdf`  | 1 deck    | `.pdf`                    | LibreOffice (`soffice`) |
//! | `video-to-audio` | 1 video   | `.mp3`                    | `ffmpeg` |
//!
//! pdfium, LibreOffice and ffmpeg are found at runtime. pdf-to-word prefers
//! LibreOffice's PDF import, which keeps layout and images, and falls back to
//! pdfium text extraction when no office suite is installed
//! ([`WordBackend`]). When one is missing
//! the request fails with [`ConvertError::MissingDependency`] (or
//! [`ConvertError::PdfiumBindingFailed`]), which [`ConvertError::is_retryable`]
//! reports as an environment problem rather than a bad input.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use convertkit::{convert_files, write_output, ConversionConfig, Operation};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inputs = vec![PathBuf::from("part1.pdf"), PathBuf::from("part2.pdf")];
//!     let output = convert_files(Operation::MergePdfs, &inputs, &ConversionConfig::default()).await?;
//!     write_output(&output, &output.filename).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convertkit` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! convertkit = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod operation;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSize, WordBackend};
pub use dispatch::{convert_files, dispatch, dispatch_sync, write_output};
pub use error::{ConvertError, FailureKind};
pub use operation::{Cardinality, Operation};
pub use output::{ConversionOutput, ConversionReport};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{ConversionRequest, InputFile};
