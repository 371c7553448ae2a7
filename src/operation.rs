//! The seven conversion kinds and their routing metadata.
//!
//! Everything the dispatcher needs to know about an operation that is not
//! the conversion itself lives here: how many inputs it takes, which file
//! extensions it accepts, what it produces, and what the result should be
//! called.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Image extensions accepted by the raster-based operations.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];
const PDF_EXTENSIONS: &[&str] = &["pdf"];
const SLIDE_EXTENSIONS: &[&str] = &["ppt", "pptx", "odp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];

/// Stem used when an input filename has none.
const FALLBACK_STEM: &str = "converted";

/// A user-selectable conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Any image → multi-resolution `.ico`.
    ImageToIcon,
    /// PDF → `.docx`.
    PdfToWord,
    /// N PDFs → one PDF, input order preserved.
    MergePdfs,
    /// N images → one PDF, one page per image.
    ImagesToPdf,
    /// Image → RGB `.png`.
    JpgToPng,
    /// Slide deck → PDF via a headless office converter.
    SlidesToPdf,
    /// Video → `.mp3` audio track.
    VideoToAudio,
}

/// How many input files an operation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one input.
    Single,
    /// One or more inputs, processed in order.
    Multiple,
}

impl Operation {
    /// All operations, in menu order.
    pub const ALL: [Operation; 7] = [
        Operation::ImageToIcon,
        Operation::PdfToWord,
        Operation::MergePdfs,
        Operation::ImagesToPdf,
        Operation::JpgToPng,
        Operation::SlidesToPdf,
        Operation::VideoToAudio,
    ];

    /// Kebab-case identifier, e.g. `merge-pdfs`.
    pub fn name(self) -> &'static str {
        match self {
            Operation::ImageToIcon => "image-to-icon",
            Operation::PdfToWord => "pdf-to-word",
            Operation::MergePdfs => "merge-pdfs",
            Operation::ImagesToPdf => "images-to-pdf",
            Operation::JpgToPng => "jpg-to-png",
            Operation::SlidesToPdf => "slides-to-pdf",
            Operation::VideoToAudio => "video-to-audio",
        }
    }

    /// One-line description used by `--list`.
    pub fn description(self) -> &'static str {
        match self {
            Operation::ImageToIcon => "Image to ICO (16, 32, 48, 64, 128 px)",
            Operation::PdfToWord => "PDF to Word document",
            Operation::MergePdfs => "Merge PDFs in the given order",
            Operation::ImagesToPdf => "Images to PDF, one centred page per image",
            Operation::JpgToPng => "JPG (or any image) to RGB PNG",
            Operation::SlidesToPdf => "PowerPoint deck to PDF (needs LibreOffice)",
            Operation::VideoToAudio => "Video to MP3 (needs ffmpeg)",
        }
    }

    pub fn cardinality(self) -> Cardinality {
        match self {
            Operation::MergePdfs | Operation::ImagesToPdf => Cardinality::Multiple,
            _ => Cardinality::Single,
        }
    }

    /// Lower-case extensions (without dot) this operation accepts.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Operation::ImageToIcon | Operation::ImagesToPdf | Operation::JpgToPng => {
                IMAGE_EXTENSIONS
            }
            Operation::PdfToWord | Operation::MergePdfs => PDF_EXTENSIONS,
            Operation::SlidesToPdf => SLIDE_EXTENSIONS,
            Operation::VideoToAudio => VIDEO_EXTENSIONS,
        }
    }

    /// Whether `filename` carries an accepted extension (case-insensitive).
    pub fn accepts(self, filename: &str) -> bool {
        extension_of(filename)
            .map(|ext| self.accepted_extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Whether inputs must be validated as PDFs before delegation.
    pub fn takes_pdf(self) -> bool {
        matches!(self, Operation::PdfToWord | Operation::MergePdfs)
    }

    /// Extension of the produced file, without dot.
    pub fn output_extension(self) -> &'static str {
        match self {
            Operation::ImageToIcon => "ico",
            Operation::PdfToWord => "docx",
            Operation::MergePdfs | Operation::ImagesToPdf | Operation::SlidesToPdf => "pdf",
            Operation::JpgToPng => "png",
            Operation::VideoToAudio => "mp3",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Operation::ImageToIcon => "image/x-icon",
            Operation::PdfToWord => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Operation::MergePdfs | Operation::ImagesToPdf | Operation::SlidesToPdf => {
                "application/pdf"
            }
            Operation::JpgToPng => "image/png",
            Operation::VideoToAudio => "audio/mpeg",
        }
    }

    /// Suggested download name given the first input's original filename.
    ///
    /// Multi-input operations and slides use fixed names; the rest keep the
    /// input's stem.
    pub fn suggested_filename(self, first_input: &str) -> String {
        match self {
            Operation::MergePdfs => "merged_document.pdf".to_string(),
            Operation::ImagesToPdf => "converted_images.pdf".to_string(),
            Operation::SlidesToPdf => "converted_presentation.pdf".to_string(),
            _ => format!("{}.{}", file_stem(first_input), self.output_extension()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
                format!("unknown operation '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Lower-cased final extension of `filename`, if any.
pub(crate) fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// Filename without directories or final extension.
fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_STEM)
        .to_string()
}
