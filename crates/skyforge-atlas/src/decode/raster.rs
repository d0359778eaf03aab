//! PNG, JPEG, TGA and friends, through the `image` crate.

use image::{ImageReader, RgbaImage};

use super::{DecodeError, FaceDecoder};
use crate::face::FaceSource;

/// Decoder for formats the image library handles natively.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterDecoder;

impl FaceDecoder for RasterDecoder {
    fn decode(&self, source: &FaceSource) -> Result<RgbaImage, DecodeError> {
        let image = ImageReader::open(&source.path)?
            .with_guessed_format()?
            .decode()?;
        Ok(image.to_rgba8())
    }
}
