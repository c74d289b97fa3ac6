//! 8-bit JPEG output (§6): a thin wrapper over the `image` crate's
//! JPEG encoder. The encoder itself is an out-of-scope collaborator;
//! only the sRGB quantization glue belongs to this crate.

use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::RenderError;
use crate::maps::RealImageBuffer;
use crate::math::Float;

fn srgb_encode(c: Float) -> Float {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn quantize(c: Float) -> u8 {
    (srgb_encode(c).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Encodes `image` as an 8-bit sRGB JPEG at `quality` (1..=100) into
/// `writer` (§6).
pub fn write<W: Write>(writer: W, image: &RealImageBuffer, quality: u8) -> Result<(), RenderError> {
    let quality = quality.clamp(1, 100);
    let mut bytes = Vec::with_capacity(image.width * image.height * 3);
    for chunk in image.rgb.chunks_exact(3) {
        bytes.push(quantize(chunk[0]));
        bytes.push(quantize(chunk[1]));
        bytes.push(quantize(chunk[2]));
    }

    JpegEncoder::new_with_quality(writer, quality).write_image(
        &bytes,
        image.width as u32,
        image.height as u32,
        ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_quantizes_to_zero_and_white_to_255() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
    }

    #[test]
    fn out_of_range_values_clamp_before_quantizing() {
        assert_eq!(quantize(-1.0), 0);
        assert_eq!(quantize(2.0), 255);
    }

    #[test]
    fn writes_a_nonempty_jpeg_stream() {
        let image = RealImageBuffer {
            width: 4,
            height: 4,
            rgb: vec![0.5; 4 * 4 * 3],
        };
        let mut buf = Vec::new();
        write(&mut buf, &image, 90).unwrap();
        assert!(!buf.is_empty());
        assert_eq!(&buf[0..2], &[0xFF, 0xD8]);
    }
}
