//! Decoding and re-encoding of captured photos.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, anyhow};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder as _, ImageFormat, ImageReader};

use crate::types::{CaptureOptions, Encoding};

use super::Result;

/// Extensions the capture pipeline accepts as input (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode `data`, optionally applying its EXIF orientation, and re-encode it per `options`.
pub fn reencode(path: &Path, data: &[u8], options: &CaptureOptions) -> Result<Vec<u8>> {
    let image = decode(path, data, options.correct_orientation)?;
    encode(image, options.encoding, options.quality)
}

fn decode(path: &Path, data: &[u8], correct_orientation: bool) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(anyhow!("empty image data for {:?}", path));
    }

    let reader = if let Some(format) = infer_format(path) {
        ImageReader::with_format(Cursor::new(data), format)
    } else {
        ImageReader::new(Cursor::new(data)).with_guessed_format().context("guessing image format")?
    };

    let mut decoder =
        reader.into_decoder().with_context(|| format!("constructing decoder for {:?}", path))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image =
        DynamicImage::from_decoder(decoder).with_context(|| format!("decoding image {:?}", path))?;
    if correct_orientation {
        apply_orientation(&mut image, orientation);
    }
    Ok(image)
}

fn encode(image: DynamicImage, encoding: Encoding, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match encoding {
        Encoding::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.into_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder).context("encoding jpeg")?;
        }
        Encoding::Png => {
            image.write_with_encoder(PngEncoder::new(&mut bytes)).context("encoding png")?;
        }
    }
    Ok(bytes)
}

fn infer_format(path: &Path) -> Option<ImageFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| ImageFormat::from_extension(&ext))
}

fn apply_orientation(image: &mut DynamicImage, orientation: Orientation) {
    if orientation != Orientation::NoTransforms {
        image.apply_orientation(orientation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x * 40) as u8, (y * 40) as u8, 128, 255])
        });
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(buffer).write_to(&mut cursor, ImageFormat::Png).expect("encode");
        cursor.into_inner()
    }

    #[test]
    fn apply_orientation_rotates_dimensions() {
        let mut image = DynamicImage::ImageRgba8(ImageBuffer::from_fn(2, 1, |x, _| match x {
            0 => Rgba([255, 0, 0, 255]),
            _ => Rgba([0, 255, 0, 255]),
        }));

        apply_orientation(&mut image, Orientation::Rotate90);

        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 2);
    }

    #[test]
    fn reencodes_as_jpeg() {
        let options = CaptureOptions::default();
        let bytes = reencode(Path::new("shot.png"), &sample_png(4, 3), &options).expect("jpeg");

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn lower_quality_produces_smaller_output() {
        let source = sample_png(64, 64);
        let low = CaptureOptions { quality: 5, ..CaptureOptions::default() };
        let high = CaptureOptions { quality: 95, ..CaptureOptions::default() };

        let low = reencode(Path::new("a.png"), &source, &low).unwrap();
        let high = reencode(Path::new("a.png"), &source, &high).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn reencodes_as_png() {
        let options = CaptureOptions { encoding: Encoding::Png, ..CaptureOptions::default() };
        let bytes = reencode(Path::new("shot.png"), &sample_png(2, 2), &options).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn rejects_empty_input() {
        let err = reencode(Path::new("empty.jpg"), &[], &CaptureOptions::default()).unwrap_err();
        assert!(err.to_string().contains("empty image data"));
    }

    #[test]
    fn recognises_supported_extensions() {
        assert!(is_supported_image(Path::new("IMG_0001.JPG")));
        assert!(!is_supported_image(Path::new("notes.txt")));
    }
}
