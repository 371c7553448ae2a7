//! Configuration types for file conversions.
//!
//! All tunable behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Every field has a default matching
//! the classic behaviour (letter pages, 1-inch margins, five icon sizes), so
//! `ConversionConfig::default()` is always a valid choice.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Icon resolutions written by image-to-icon.
pub const DEFAULT_ICON_SIZES: [u32; 5] = [16, 32, 48, 64, 128];

/// Points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Configuration for a conversion request.
///
/// # Example
/// ```rust
/// use convertkit::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .page_size(PageSize::A4)
///     .margin_pt(36.0)
///     .process_timeout_secs(Some(120))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Page size for images-to-pdf. Default: [`PageSize::Letter`].
    pub page_size: PageSize,

    /// Margin kept free on every side of an images-to-pdf page, in points.
    /// Default: 72 (one inch).
    pub margin_pt: f32,

    /// Square frame sizes written into `.ico` files. Default: 16, 32, 48, 64, 128.
    ///
    /// The ICO directory stores dimensions in a single byte, so each size
    /// must be within 1–256.
    pub icon_sizes: Vec<u32>,

    /// How pdf-to-word produces its document. Default: [`WordBackend::Auto`].
    pub word_backend: WordBackend,

    /// MP3 bitrate for video-to-audio, in kbit/s. Default: 192.
    pub audio_bitrate_kbps: u32,

    /// Wall-clock limit for external processes (office converter, ffmpeg).
    /// `None` waits forever. Default: 300 s.
    pub process_timeout_secs: Option<u64>,

    /// Explicit path to `soffice`/`libreoffice`. If None, searched on PATH.
    pub soffice_path: Option<PathBuf>,

    /// Explicit path to `ffmpeg`. If None, searched on PATH.
    pub ffmpeg_path: Option<PathBuf>,

    /// Directory containing the pdfium shared library (or the library file
    /// itself). If None, the system library path is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Parent directory for per-request workspaces. If None, the system
    /// temp directory.
    pub temp_root: Option<PathBuf>,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin_pt: POINTS_PER_INCH,
            icon_sizes: DEFAULT_ICON_SIZES.to_vec(),
            word_backend: WordBackend::default(),
            audio_bitrate_kbps: 192,
            process_timeout_secs: Some(300),
            soffice_path: None,
            ffmpeg_path: None,
            pdfium_lib_path: None,
            temp_root: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("page_size", &self.page_size)
            .field("margin_pt", &self.margin_pt)
            .field("icon_sizes", &self.icon_sizes)
            .field("word_backend", &self.word_backend)
            .field("audio_bitrate_kbps", &self.audio_bitrate_kbps)
            .field("process_timeout_secs", &self.process_timeout_secs)
            .field("soffice_path", &self.soffice_path)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("temp_root", &self.temp_root)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Width and height of the area inside the margins, in points.
    pub fn usable_area(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions_pt();
        (w - 2.0 * self.margin_pt, h - 2.0 * self.margin_pt)
    }

    /// Check the constraints [`ConversionConfigBuilder::build`] enforces.
    ///
    /// The fields are public, so [`dispatch`](crate::dispatch) re-checks
    /// every config it is handed.
    pub fn validate(&self) -> Result<(), ConvertError> {
        let (page_w, page_h) = self.page_size.dimensions_pt();
        if !(page_w.is_finite() && page_h.is_finite() && page_w > 0.0 && page_h > 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "Page size must be finite and positive, got {page_w} x {page_h} pt"
            )));
        }
        if !self.margin_pt.is_finite() || self.margin_pt < 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "Margin must be a non-negative number of points, got {}",
                self.margin_pt
            )));
        }
        let (w, h) = self.usable_area();
        if w <= 0.0 || h <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "Margin of {}pt leaves no usable area on a {:?} page",
                self.margin_pt, self.page_size
            )));
        }
        if self.icon_sizes.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "At least one icon size is required".into(),
            ));
        }
        if let Some(bad) = self.icon_sizes.iter().find(|&&s| s == 0 || s > 256) {
            return Err(ConvertError::InvalidConfig(format!(
                "Icon sizes must be 1–256 px, got {bad}"
            )));
        }
        if self.process_timeout_secs == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "Process timeout must be ≥ 1 second (use None to disable)".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin_pt(mut self, margin: f32) -> Self {
        self.config.margin_pt = margin;
        self
    }

    pub fn icon_sizes(mut self, sizes: impl Into<Vec<u32>>) -> Self {
        self.config.icon_sizes = sizes.into();
        self
    }

    pub fn word_backend(mut self, backend: WordBackend) -> Self {
        self.config.word_backend = backend;
        self
    }

    pub fn audio_bitrate_kbps(mut self, kbps: u32) -> Self {
        self.config.audio_bitrate_kbps = kbps.clamp(32, 320);
        self
    }

    pub fn process_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.process_timeout_secs = secs;
        self
    }

    pub fn soffice_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.soffice_path = Some(path.into());
        self
    }

    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = Some(path.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_root = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        self.config.validate()?;
        let mut config = self.config;
        config.icon_sizes.sort_unstable();
        config.icon_sizes.dedup();
        Ok(config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Page size used when composing images into a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// US Letter, 612 × 792 pt. (default)
    #[default]
    Letter,
    /// ISO A4, 595.28 × 841.89 pt.
    A4,
    /// Arbitrary size in points.
    Custom { width_pt: f32, height_pt: f32 },
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match *self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Custom {
                width_pt,
                height_pt,
            } => (width_pt, height_pt),
        }
    }
}

/// Engine used by pdf-to-word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordBackend {
    /// LibreOffice when installed, otherwise the text-only writer. (default)
    #[default]
    Auto,
    /// LibreOffice's PDF import: keeps positioning, images and tables.
    Office,
    /// pdfium text extraction: one paragraph per line, page breaks kept.
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_usable_area_is_letter_minus_one_inch() {
        let config = ConversionConfig::default();
        assert_eq!(config.usable_area(), (468.0, 648.0));
        assert_eq!(config.icon_sizes, vec![16, 32, 48, 64, 128]);
    }

    #[test]
    fn builder_rejects_oversized_margin() {
        let err = ConversionConfig::builder().margin_pt(400.0).build().unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_icon_size_over_256() {
        let err = ConversionConfig::builder()
            .icon_sizes(vec![16, 512])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("512"));
    }

    #[test]
    fn builder_sorts_and_dedups_icon_sizes() {
        let config = ConversionConfig::builder()
            .icon_sizes(vec![64, 16, 64, 32])
            .build()
            .unwrap();
        assert_eq!(config.icon_sizes, vec![16, 32, 64]);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ConversionConfig::builder()
            .process_timeout_secs(Some(0))
            .build()
            .is_err());
        assert!(ConversionConfig::builder()
            .process_timeout_secs(None)
            .build()
            .is_ok());
    }

    #[test]
    fn bitrate_is_clamped() {
        let config = ConversionConfig::builder()
            .audio_bitrate_kbps(1000)
            .build()
            .unwrap();
        assert_eq!(config.audio_bitrate_kbps, 320);
    }

    #[test]
    fn builder_rejects_non_finite_page_sizes() {
        for (w, h) in [(f32::NAN, 792.0), (612.0, f32::INFINITY), (-612.0, 792.0)] {
            let err = ConversionConfig::builder()
                .page_size(PageSize::Custom {
                    width_pt: w,
                    height_pt: h,
                })
                .build()
                .unwrap_err();
            assert!(matches!(err, ConvertError::InvalidConfig(_)), "{w} x {h}");
        }
    }

    #[test]
    fn validate_catches_fields_set_after_build() {
        let config = ConversionConfig {
            icon_sizes: vec![0, 16],
            ..ConversionConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ConversionConfig {
            icon_sizes: vec![16],
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn a4_dimensions() {
        let (w, h) = PageSize::A4.dimensions_pt();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }
}
