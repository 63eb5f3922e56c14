//! JPEG/Base64 conversion between the on-screen photograph and the wire payload.

use crate::error::CodecError;
use crate::frame::{CapturedImage, ImageSource};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use std::fmt;
use tracing::debug;

/// JPEG quality used for every submitted photo
pub const JPEG_QUALITY: u8 = 100;

/// Base64 text of a JPEG-compressed photo. Rebuilt before every request.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedPayload({} chars)", self.0.len())
    }
}

/// Compress to JPEG at maximum quality and encode as Base64 text.
pub fn encode(image: &CapturedImage) -> Result<EncodedPayload, CodecError> {
    let jpeg = encode_jpeg(image)?;
    let text = BASE64.encode(&jpeg);

    debug!(
        "Encoded {}x{} image: {} JPEG bytes, {} Base64 chars",
        image.width(),
        image.height(),
        jpeg.len(),
        text.len()
    );

    Ok(EncodedPayload(text))
}

/// JPEG bytes of the image at [`JPEG_QUALITY`]
pub fn encode_jpeg(image: &CapturedImage) -> Result<Vec<u8>, CodecError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CodecError::Empty);
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(image.pixels())
        .map_err(|e| CodecError::Encode {
            details: e.to_string(),
        })?;

    Ok(jpeg)
}

/// Decode raw image bytes (a capture on disk or a fetched score result).
pub fn decode(bytes: &[u8], source: ImageSource) -> Result<CapturedImage, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| CodecError::InvalidImage {
        details: e.to_string(),
    })?;
    let pixels = decoded.to_rgb8();

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(CodecError::Empty);
    }

    debug!(
        "Decoded {} bytes into {}x{} image",
        bytes.len(),
        pixels.width(),
        pixels.height()
    );

    Ok(CapturedImage::new(pixels, source))
}

/// Inverse of [`encode`]: Base64 text back to pixels.
pub fn decode_payload(
    payload: &EncodedPayload,
    source: ImageSource,
) -> Result<CapturedImage, CodecError> {
    let bytes = BASE64
        .decode(payload.as_str())
        .map_err(|e| CodecError::InvalidImage {
            details: format!("payload is not Base64: {}", e),
        })?;
    decode(&bytes, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::PathBuf;

    fn camera() -> ImageSource {
        ImageSource::Camera {
            path: PathBuf::from("tmp.jpg"),
        }
    }

    fn board(width: u32, height: u32) -> CapturedImage {
        let pixels = RgbImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgb([220, 180, 90])
            } else {
                Rgb([20, 20, 20])
            }
        });
        CapturedImage::new(pixels, camera())
    }

    #[test]
    fn test_round_trip_preserves_dimensions_and_format() {
        let original = board(64, 48);

        let payload = encode(&original).unwrap();
        let raw = BASE64.decode(payload.as_str()).unwrap();
        assert_eq!(image::guess_format(&raw).unwrap(), ImageFormat::Jpeg);

        let restored = decode_payload(&payload, camera()).unwrap();
        assert_eq!(restored.dimensions(), original.dimensions());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let image = board(32, 32);

        assert_eq!(encode(&image).unwrap(), encode(&image).unwrap());
    }

    #[test]
    fn test_payload_has_no_line_breaks() {
        let payload = encode(&board(128, 128)).unwrap();

        assert!(payload.len() > 76);
        assert!(!payload.as_str().contains('\n'));
    }

    #[test]
    fn test_encode_empty_image_fails() {
        let empty = CapturedImage::new(RgbImage::new(0, 0), camera());

        assert!(matches!(encode(&empty), Err(CodecError::Empty)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(&[], camera()), Err(CodecError::Empty)));
        assert!(matches!(
            decode(b"<html>not found</html>", camera()),
            Err(CodecError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_decode_png_result() {
        let mut png = Vec::new();
        RgbImage::new(9, 9)
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let image = decode(
            &png,
            ImageSource::ScoreResult {
                reference: "r.png".to_string(),
            },
        )
        .unwrap();
        assert_eq!(image.dimensions(), (9, 9));
    }
}
