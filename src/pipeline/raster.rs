//! Raster helpers shared by the image operations, plus jpg-to-png.
//!
//! The image codec guesses the format from the content, not the extension,
//! so a PNG uploaded as `photo.jpg` still decodes.

use crate::error::ConvertError;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::path::Path;
use tracing::debug;

/// Decode an image file, guessing the format from its content.
pub fn decode(path: &Path, name: &str) -> Result<DynamicImage, ConvertError> {
    let img = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ConvertError::ImageDecode {
            name: name.to_string(),
            detail: e.to_string(),
        })?
        .decode()
        .map_err(|e| ConvertError::ImageDecode {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
    debug!(
        "Decoded '{}' → {}x{} {:?}",
        name,
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Flatten any colour model (grey, palette, alpha, 16-bit) to 8-bit RGB.
///
/// Alpha is dropped, not composited: transparent pixels keep their colour.
pub fn to_rgb(img: DynamicImage) -> RgbImage {
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

/// jpg-to-png: decode, force RGB, write PNG to `output`.
pub fn jpg_to_png(input: &Path, name: &str, output: &Path) -> Result<(), ConvertError> {
    let rgb = to_rgb(decode(input, name)?);
    rgb.save_with_format(output, ImageFormat::Png)
        .map_err(|e| ConvertError::Encode(format!("PNG encoding failed: {e}")))?;
    debug!("Wrote {}x{} RGB PNG", rgb.width(), rgb.height());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgba, RgbaImage};

    #[test]
    fn rgba_png_loses_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbaImage::from_pixel(7, 5, Rgba([10, 20, 30, 0]))
            .save(&input)
            .unwrap();

        jpg_to_png(&input, "in.png", &output).unwrap();

        let decoded = image::open(&output).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.jpg");
        std::fs::write(&input, b"definitely not a jpeg").unwrap();

        let err = jpg_to_png(&input, "in.jpg", &dir.path().join("out.png")).unwrap_err();
        match err {
            ConvertError::ImageDecode { name, .. } => assert_eq!(name, "in.jpg"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn to_rgb_keeps_rgb_untouched() {
        let rgb = RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let out = to_rgb(DynamicImage::ImageRgb8(rgb.clone()));
        assert_eq!(out, rgb);
    }
}
