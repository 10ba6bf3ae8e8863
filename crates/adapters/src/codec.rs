use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder as _, ImageReader};
use memeify_application::{ApplicationError, ImageEncoder};
use memeify_domain::{Bitmap, CompressFormat};

/// Compresses bitmaps through the image crate. PNG ignores the quality
/// knob; JPEG is encoded at the requested quality with alpha dropped.
#[derive(Debug, Default)]
pub struct ImageCrateEncoder;

impl ImageEncoder for ImageCrateEncoder {
    fn encode(
        &self,
        bitmap: &Bitmap,
        format: CompressFormat,
        quality: u8,
    ) -> Result<Vec<u8>, ApplicationError> {
        let mut out = Vec::new();
        match format {
            CompressFormat::Png => {
                PngEncoder::new(&mut out)
                    .write_image(
                        bitmap.pixels(),
                        bitmap.width(),
                        bitmap.height(),
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(|error| ApplicationError::Encode(error.to_string()))?;
            }
            CompressFormat::Jpeg => {
                let rgb = drop_alpha(bitmap.pixels());
                JpegEncoder::new_with_quality(&mut out, quality)
                    .write_image(
                        &rgb,
                        bitmap.width(),
                        bitmap.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(|error| ApplicationError::Encode(error.to_string()))?;
            }
        }
        Ok(out)
    }
}

fn drop_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
        .collect()
}

/// Decodes an image file into the RGBA bitmap the gateways consume.
pub fn load_bitmap(path: &Path) -> Result<Bitmap, ApplicationError> {
    let image = ImageReader::open(path)
        .map_err(|error| ApplicationError::Io(error.to_string()))?
        .with_guessed_format()
        .map_err(|error| ApplicationError::Io(error.to_string()))?
        .decode()
        .map_err(|error| ApplicationError::Decode(error.to_string()))?;

    let rgba = image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    Bitmap::new(width, height, rgba.into_raw()).map_err(ApplicationError::from)
}

#[cfg(test)]
mod tests {
    use memeify_application::QUALITY;
    use tempfile::TempDir;

    use super::*;

    fn bitmap() -> Bitmap {
        let pixels = (0..4 * 3 * 4).map(|value| value as u8).collect();
        Bitmap::new(4, 3, pixels).expect("bitmap")
    }

    #[test]
    fn png_output_round_trips() {
        let bytes = ImageCrateEncoder
            .encode(&bitmap(), CompressFormat::Png, QUALITY)
            .expect("encode");

        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.to_rgba8().into_raw(), bitmap().pixels());
    }

    #[test]
    fn jpeg_output_decodes_with_same_dimensions() {
        let bytes = ImageCrateEncoder
            .encode(&bitmap(), CompressFormat::Jpeg, QUALITY)
            .expect("encode");

        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn load_bitmap_reads_back_written_pixels() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("sample.png");

        let bytes = ImageCrateEncoder
            .encode(&bitmap(), CompressFormat::Png, QUALITY)
            .expect("encode");
        std::fs::write(&path, bytes).expect("write");

        let loaded = load_bitmap(&path).expect("load");
        assert_eq!(loaded.width(), 4);
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.pixels(), bitmap().pixels());
    }
}
