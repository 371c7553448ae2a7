//! image-to-icon: write a multi-resolution `.ico`.
//!
//! Each configured size becomes one PNG-compressed ICO frame. Non-square
//! sources are scaled to fit and centred on a transparent square canvas so
//! every frame has exactly the declared dimensions.

use crate::error::ConvertError;
use crate::pipeline::raster;
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Encode `input` as an ICO containing one frame per entry in `sizes`.
pub fn image_to_icon(
    input: &Path,
    name: &str,
    output: &Path,
    sizes: &[u32],
) -> Result<(), ConvertError> {
    let img = raster::decode(input, name)?;

    let frames: Vec<RgbaImage> = sizes.iter().map(|&size| square_frame(&img, size)).collect();
    let ico_frames = frames
        .iter()
        .map(|frame| {
            IcoFrame::as_png(
                frame.as_raw(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgba8,
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConvertError::Encode(format!("ICO frame encoding failed: {e}")))?;

    let file = File::create(output).map_err(ConvertError::workspace)?;
    IcoEncoder::new(BufWriter::new(file))
        .encode_images(&ico_frames)
        .map_err(|e| ConvertError::Encode(format!("ICO encoding failed: {e}")))?;

    debug!("Wrote ICO with sizes {:?}", sizes);
    Ok(())
}

/// Fit `img` inside a `size`×`size` transparent canvas, preserving aspect.
fn square_frame(img: &DynamicImage, size: u32) -> RgbaImage {
    // resize() keeps aspect ratio and never exceeds the bounds.
    let scaled = img.resize(size, size, FilterType::Lanczos3).to_rgba8();
    if scaled.width() == size && scaled.height() == size {
        return scaled;
    }
    let mut canvas = RgbaImage::new(size, size);
    let x = size.saturating_sub(scaled.width()) / 2;
    let y = size.saturating_sub(scaled.height()) / 2;
    imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbImage};

    /// `(width, height)` for every entry of an ICO directory.
    fn ico_directory(bytes: &[u8]) -> Vec<(u32, u32)> {
        assert_eq!(&bytes[0..4], &[0, 0, 1, 0], "not an ICO header");
        let count = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;
        (0..count)
            .map(|i| {
                let entry = &bytes[6 + i * 16..6 + (i + 1) * 16];
                let dim = |b: u8| if b == 0 { 256 } else { u32::from(b) };
                (dim(entry[0]), dim(entry[1]))
            })
            .collect()
    }

    #[test]
    fn writes_all_five_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("logo.png");
        let output = dir.path().join("logo.ico");
        RgbImage::from_pixel(300, 120, image::Rgb([200, 10, 10]))
            .save(&input)
            .unwrap();

        image_to_icon(&input, "logo.png", &output, &[16, 32, 48, 64, 128]).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(
            ico_directory(&bytes),
            vec![(16, 16), (32, 32), (48, 48), (64, 64), (128, 128)]
        );
    }

    #[test]
    fn tiny_source_is_upscaled_to_every_size() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dot.png");
        let output = dir.path().join("dot.ico");
        RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]))
            .save(&input)
            .unwrap();

        image_to_icon(&input, "dot.png", &output, &[16, 256]).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(ico_directory(&bytes), vec![(16, 16), (256, 256)]);
    }

    #[test]
    fn wide_image_is_letterboxed_with_transparency() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 10, Rgba([9, 9, 9, 255])));
        let frame = square_frame(&img, 32);
        assert_eq!(frame.dimensions(), (32, 32));
        assert_eq!(frame.get_pixel(16, 0).0[3], 0, "top band is transparent");
        assert_eq!(frame.get_pixel(16, 16).0[3], 255, "centre is opaque");
    }
}
