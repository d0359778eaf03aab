//! Floating-point sources (Radiance HDR, OpenEXR).
//!
//! Values are clipped to `[0, 1]` and scaled to 8 bits. This is not real tone
//! mapping: anything brighter than 1.0 saturates.

use image::{DynamicImage, ImageReader, Rgba, RgbaImage};

use super::{DecodeError, FaceDecoder};
use crate::face::FaceSource;

/// Decoder for high-dynamic-range face images.
#[derive(Clone, Copy, Debug, Default)]
pub struct HdrDecoder;

impl FaceDecoder for HdrDecoder {
    fn decode(&self, source: &FaceSource) -> Result<RgbaImage, DecodeError> {
        let image = ImageReader::open(&source.path)?
            .with_guessed_format()?
            .decode()?;
        tone_map(&image)
    }
}

/// Clip-and-scale a floating-point image to RGBA8.
///
/// Three-channel images get an opaque alpha channel.
///
/// # Errors
///
/// [`DecodeError::UnsupportedChannelCount`] for anything but 3 or 4 channels.
pub fn tone_map(image: &DynamicImage) -> Result<RgbaImage, DecodeError> {
    let channels = image.color().channel_count();
    let float = match channels {
        3 => {
            let rgb = image.to_rgb32f();
            image::Rgba32FImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Rgba([r, g, b, 1.0])
            })
        }
        4 => image.to_rgba32f(),
        channels => return Err(DecodeError::UnsupportedChannelCount { channels }),
    };

    Ok(RgbaImage::from_fn(float.width(), float.height(), |x, y| {
        Rgba(float.get_pixel(x, y).0.map(to_u8))
    }))
}

fn to_u8(value: f32) -> u8 {
    // NaN saturates to 0.
    (value.clamp(0.0, 1.0) * 255.0) as u8
}
