//! Conversion results.

use crate::operation::Operation;
use serde::{Deserialize, Serialize};

/// A finished conversion: the file to hand back to the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    /// Complete content of the produced file.
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `logo.ico`.
    pub filename: String,
    /// MIME type matching `filename`.
    pub mime_type: String,
}

impl std::fmt::Debug for ConversionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionOutput")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Serialisable summary of a finished conversion (no payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub operation: Operation,
    /// Original names of the inputs, in processing order.
    pub inputs: Vec<String>,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: usize,
    /// Wall-clock time spent in the dispatcher.
    pub duration_ms: u64,
}

impl ConversionReport {
    pub fn new(
        operation: Operation,
        inputs: Vec<String>,
        output: &ConversionOutput,
        duration_ms: u64,
    ) -> Self {
        Self {
            operation,
            inputs,
            filename: output.filename.clone(),
            mime_type: output.mime_type.clone(),
            size_bytes: output.bytes.len(),
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serialises_operation_name() {
        let output = ConversionOutput {
            bytes: vec![1, 2, 3],
            filename: "clip.mp3".into(),
            mime_type: "audio/mpeg".into(),
        };
        let report =
            ConversionReport::new(Operation::VideoToAudio, vec!["clip.mp4".into()], &output, 12);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["operation"], "video-to-audio");
        assert_eq!(json["size_bytes"], 3);
        assert_eq!(json["filename"], "clip.mp3");
    }
}
