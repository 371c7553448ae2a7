//! Conversion requests: an operation plus its uploaded files.

use crate::error::ConvertError;
use crate::operation::{Cardinality, Operation};
use std::path::Path;

/// One uploaded file: its original name and content.
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its filename as the name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// A validated, immutable conversion request.
///
/// Construction checks cardinality and extensions so every stage downstream
/// can assume it got what it asked for.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    operation: Operation,
    inputs: Vec<InputFile>,
}

impl ConversionRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    /// * [`ConvertError::NoInputs`] when `inputs` is empty
    /// * [`ConvertError::TooManyInputs`] when a single-input operation gets more
    /// * [`ConvertError::UnsupportedInput`] when an extension is not accepted
    pub fn new(operation: Operation, inputs: Vec<InputFile>) -> Result<Self, ConvertError> {
        if inputs.is_empty() {
            return Err(ConvertError::NoInputs { operation });
        }
        if operation.cardinality() == Cardinality::Single && inputs.len() > 1 {
            return Err(ConvertError::TooManyInputs {
                operation,
                count: inputs.len(),
            });
        }
        if let Some(bad) = inputs.iter().find(|f| !operation.accepts(&f.name)) {
            return Err(ConvertError::UnsupportedInput {
                name: bad.name.clone(),
                operation,
                accepted: operation.accepted_extensions().join(", "),
            });
        }
        Ok(Self { operation, inputs })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn inputs(&self) -> &[InputFile] {
        &self.inputs
    }

    /// Download name for this request's result.
    pub fn suggested_filename(&self) -> String {
        let first = self.inputs.first().map(|f| f.name.as_str()).unwrap_or("");
        self.operation.suggested_filename(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> InputFile {
        InputFile::new(name, b"data".to_vec())
    }

    #[test]
    fn empty_request_is_rejected() {
        let err = ConversionRequest::new(Operation::MergePdfs, vec![]).unwrap_err();
        assert!(matches!(err, ConvertError::NoInputs { .. }));
    }

    #[test]
    fn single_input_operation_rejects_two_files() {
        let err = ConversionRequest::new(Operation::PdfToWord, vec![file("a.pdf"), file("b.pdf")])
            .unwrap_err();
        assert!(matches!(err, ConvertError::TooManyInputs { count: 2, .. }));
    }

    #[test]
    fn wrong_extension_is_rejected_by_name() {
        let err = ConversionRequest::new(
            Operation::ImagesToPdf,
            vec![file("a.png"), file("notes.txt")],
        )
        .unwrap_err();
        match err {
            ConvertError::UnsupportedInput { name, .. } => assert_eq!(name, "notes.txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn valid_request_keeps_input_order() {
        let req = ConversionRequest::new(
            Operation::MergePdfs,
            vec![file("b.pdf"), file("a.pdf"), file("c.pdf")],
        )
        .unwrap();
        let names: Vec<&str> = req.inputs().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf", "c.pdf"]);
        assert_eq!(req.suggested_filename(), "merged_document.pdf");
    }

    #[test]
    fn debug_hides_payload() {
        let f = InputFile::new("x.png", vec![0u8; 4096]);
        let dbg = format!("{f:?}");
        assert!(dbg.contains("<4096 bytes>"));
    }
}
