//! Image re-encode step: decode fetched bytes, re-encode as JPEG.
//!
//! The transform is deliberately narrow — whatever format the source
//! serves (PNG, JPEG, WebP), the output is always a JPEG compressed at
//! [`JPEG_QUALITY`]. Decode and encode failures are reported separately
//! so callers can tell a corrupt source from an encoder problem.

use image::codecs::jpeg::JpegEncoder;

/// JPEG quality applied to every output image.
pub const JPEG_QUALITY: u8 = 50;

/// Error type for the decode/re-encode transform.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The fetched bytes could not be decoded as an image.
    #[error("Failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    /// The decoded image could not be re-encoded as JPEG.
    #[error("Failed to encode JPEG output: {0}")]
    Encode(#[source] image::ImageError),
}

/// Decode `bytes` and re-encode as a JPEG at [`JPEG_QUALITY`].
pub fn recompress_jpeg(bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory(bytes).map_err(TransformError::Decode)?;

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.write_with_encoder(encoder)
        .map_err(TransformError::Encode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use image::{ImageFormat, RgbImage};

    use super::*;

    fn png_fixture() -> Vec<u8> {
        let img = RgbImage::from_fn(8, 8, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 128]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn recompresses_png_input_to_jpeg() {
        let out = recompress_jpeg(&png_fixture()).unwrap();
        assert!(!out.is_empty());
        // Output must decode as JPEG.
        let format = image::guess_format(&out).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn jpeg_input_is_re_encoded_not_passed_through() {
        let first = recompress_jpeg(&png_fixture()).unwrap();
        let second = recompress_jpeg(&first).unwrap();
        assert_eq!(image::guess_format(&second).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let result = recompress_jpeg(b"definitely not an image");
        assert_matches!(result, Err(TransformError::Decode(_)));
    }

    #[test]
    fn empty_input_fails_with_decode_error() {
        assert_matches!(recompress_jpeg(&[]), Err(TransformError::Decode(_)));
    }
}
