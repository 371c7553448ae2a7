//! Pipeline stages, one capability per module.
//!
//! ```text
//! workspace ──▶ raster / icon / compose   (image codec, spawn_blocking)
//!          ├──▶ merge                     (lopdf, spawn_blocking)
//!          ├──▶ pdfium ──▶ docx           (text-only pdf-to-word, spawn_blocking)
//!          └──▶ office / audio            (external process via `process`)
//! ```
//!
//! 1. [`workspace`] stages inputs as files in a request-scoped temp directory
//! 2. [`raster`] decodes images; also implements jpg-to-png
//! 3. [`icon`] writes multi-resolution `.ico` files
//! 4. [`compose`] lays images out one per page into a PDF
//! 5. [`merge`] concatenates PDFs
//! 6. [`office`] drives LibreOffice for slides-to-pdf and pdf-to-word
//! 7. [`pdfium`] + [`docx`] extract text and package it as Word when no
//!    office suite is installed
//! 8. [`process`] locates and runs external converters for [`office`] and
//!    [`audio`]

pub mod audio;
pub mod compose;
pub mod docx;
pub mod icon;
pub mod merge;
pub mod office;
pub mod pdfium;
pub mod process;
pub mod raster;
pub mod workspace;
