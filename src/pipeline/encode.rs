//! Image encoding: `DynamicImage` → base64 JPEG wrapped in `ImageData`.
//!
//! The page is flattened to RGB first because the JPEG encoder rejects
//! alpha channels, and pdfium hands back RGBA bitmaps.

use crate::error::AtsError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// MIME type attached to every page payload.
pub const PAGE_MIME_TYPE: &str = "image/jpeg";

/// Encode a rendered page as a base64 JPEG ready for the model API.
///
/// Returns the payload and the size of the raw JPEG in bytes.
pub fn encode_page(img: &DynamicImage, quality: u8) -> Result<(ImageData, usize), AtsError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AtsError::EncodingFailed {
            detail: e.to_string(),
        })?;

    let jpeg_len = buf.len();
    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page → {} bytes JPEG, {} bytes base64", jpeg_len, b64.len());

    Ok((ImageData::new(b64, PAGE_MIME_TYPE).with_detail("high"), jpeg_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_rgba_page_as_jpeg() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 128])));
        let (data, jpeg_len) = encode_page(&img, 90).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/jpeg");
        assert!(jpeg_len > 0);

        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded.len(), jpeg_len);
        // JPEG SOI marker
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn lower_quality_is_not_larger() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255])
        }));
        let (_, high) = encode_page(&img, 95).unwrap();
        let (_, low) = encode_page(&img, 20).unwrap();
        assert!(low <= high, "low={low} high={high}");
    }
}
