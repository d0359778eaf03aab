//! Source decoders: every supported container is normalized to an RGBA8 image.

mod dxt;
mod hdr;
mod raster;
mod vtf;

pub use hdr::{HdrDecoder, tone_map};
pub use raster::RasterDecoder;
pub use vtf::{VtfDecoder, VtfFormat, VtfHeader, decode_vtf};

#[cfg(test)]
pub(crate) use vtf::tests::build_vtf;

use image::RgbaImage;

use crate::face::{FaceSource, SourceKind};

/// Errors produced while turning a source file into RGBA.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The source file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The image library rejected the file.
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// The texture uses a pixel format this decoder does not implement.
    #[error("unsupported texture format {name} (id {id})")]
    UnsupportedCompression { name: &'static str, id: i32 },

    /// A floating-point image with neither 3 nor 4 channels.
    #[error("unsupported channel count {channels}, expected 3 or 4")]
    UnsupportedChannelCount { channels: u8 },

    /// The texture header or payload is inconsistent.
    #[error("malformed texture: {0}")]
    Malformed(String),

    /// The decoded image has no pixels.
    #[error("image has zero size ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Turns one face source into an RGBA8 image.
pub trait FaceDecoder {
    /// Decode `source`.
    ///
    /// # Errors
    ///
    /// Any read, parse or conversion failure.
    fn decode(&self, source: &FaceSource) -> Result<RgbaImage, DecodeError>;
}

/// Decoder for the given source kind.
#[must_use]
pub fn decoder_for(kind: SourceKind) -> &'static dyn FaceDecoder {
    match kind {
        SourceKind::CompressedTexture => &VtfDecoder,
        SourceKind::Hdr => &HdrDecoder,
        SourceKind::StandardRaster => &RasterDecoder,
    }
}

/// Decode a face with the decoder matching its kind.
///
/// # Errors
///
/// See [`FaceDecoder::decode`]. Zero-sized results are rejected.
pub fn decode(source: &FaceSource) -> Result<RgbaImage, DecodeError> {
    log::debug!("decoding {} as {:?}", source.file_name(), source.kind);
    let image = decoder_for(source.kind).decode(source)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::Empty {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}
