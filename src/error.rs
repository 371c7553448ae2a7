//! Error types for the convertkit library.
//!
//! Every delegate failure (codec, PDF parser, external process) is caught at
//! the operation boundary and surfaces as a single [`ConvertError`]. There is
//! no partial output: a request either yields a complete file or an error.
//!
//! Errors are grouped into three [`FailureKind`]s so callers can tell a bad
//! upload from a broken environment:
//!
//! * [`FailureKind::Input`]: the file itself is the problem (corrupt PDF,
//!   undecodable image, wrong extension). Retrying will not help.
//! * [`FailureKind::Environment`]: something around the conversion is
//!   missing or exhausted (no `soffice` on PATH, pdfium library not found,
//!   temp directory not writable, process timed out). Retrying after the
//!   environment is fixed may succeed.
//! * [`FailureKind::Internal`]: a bug or an unexpected delegate result.

use crate::operation::Operation;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The supplied input cannot be converted.
    Input,
    /// A dependency or resource outside the input failed.
    Environment,
    /// Unexpected failure inside the library or a delegate.
    Internal,
}

/// All errors returned by the convertkit library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request carried no input files.
    #[error("'{operation}' needs at least one input file")]
    NoInputs { operation: Operation },

    /// A single-input operation received several files.
    #[error("'{operation}' takes exactly one input file, got {count}")]
    TooManyInputs { operation: Operation, count: usize },

    /// The input's extension is not accepted by the operation.
    #[error("'{name}' is not a valid input for '{operation}' (accepted: {accepted})")]
    UnsupportedInput {
        name: String,
        operation: Operation,
        accepted: String,
    },

    /// An input file could not be read from disk.
    #[error("Cannot read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Input content errors ──────────────────────────────────────────────
    /// The bytes submitted as a PDF do not start with `%PDF`.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// The PDF is encrypted; conversions never prompt for passwords.
    #[error("PDF '{name}' is encrypted; decrypt it first (e.g. qpdf --decrypt in.pdf out.pdf)")]
    EncryptedPdf { name: String },

    /// The image codec could not decode the input.
    #[error("Could not decode image '{name}': {detail}")]
    ImageDecode { name: String, detail: String },

    /// The external tool ran but rejected the input.
    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    ProcessFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    // ── Environment errors ────────────────────────────────────────────────
    /// A required external program is not installed.
    #[error("{tool} is required for this conversion but was not found.\n{hint}")]
    MissingDependency { tool: String, hint: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium (e.g. from bblanchon/pdfium-binaries) and either place it on\n\
the system library path or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    /// The external tool did not finish in time and was killed.
    #[error("{tool} did not finish within {secs}s and was terminated")]
    ProcessTimeout { tool: String, secs: u64 },

    /// The per-request temporary workspace could not be created or written.
    #[error("Temporary workspace error: {source}")]
    Workspace {
        #[source]
        source: std::io::Error,
    },

    /// Could not write the converted file to its destination.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Internal errors ───────────────────────────────────────────────────
    /// The delegate reported success but produced no output file.
    #[error("{tool} reported success but produced no output at '{expected}'")]
    OutputMissing { tool: String, expected: PathBuf },

    /// Encoding the output format failed.
    #[error("Failed to encode output: {0}")]
    Encode(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ConvertError::NoInputs { .. }
            | ConvertError::TooManyInputs { .. }
            | ConvertError::UnsupportedInput { .. }
            | ConvertError::InputReadFailed { .. }
            | ConvertError::NotAPdf { .. }
            | ConvertError::CorruptPdf { .. }
            | ConvertError::EncryptedPdf { .. }
            | ConvertError::ImageDecode { .. }
            | ConvertError::ProcessFailed { .. } => FailureKind::Input,

            ConvertError::MissingDependency { .. }
            | ConvertError::PdfiumBindingFailed(_)
            | ConvertError::ProcessTimeout { .. }
            | ConvertError::Workspace { .. }
            | ConvertError::OutputWriteFailed { .. } => FailureKind::Environment,

            ConvertError::OutputMissing { .. }
            | ConvertError::Encode(_)
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => FailureKind::Internal,
        }
    }

    /// `true` when the same request may succeed once the environment is fixed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Environment
    }

    pub(crate) fn workspace(source: std::io::Error) -> Self {
        ConvertError::Workspace { source }
    }
}
