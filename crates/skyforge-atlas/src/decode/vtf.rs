//! Valve Texture Format (VTF) reader.
//!
//! Only the full-resolution image of frame 0, face 0, slice 0 is extracted.
//! Header layout (little-endian):
//!
//! | offset | field                      |
//! |--------|----------------------------|
//! | 0      | `"VTF\0"`                  |
//! | 4      | version major, minor (u32) |
//! | 12     | header size (u32)          |
//! | 16     | width, height (u16)        |
//! | 20     | flags (u32)                |
//! | 24     | frames, first frame (u16)  |
//! | 52     | high-res format (i32)      |
//! | 56     | mip count (u8)             |
//! | 57     | low-res format (i32)       |
//! | 61     | low-res width, height (u8) |
//! | 63     | depth (u16, 7.2+)          |
//! | 68     | resource count (u32, 7.3+) |
//! | 80     | resource entries (7.3+)    |

use image::{Rgba, RgbaImage};

use super::dxt::{self, Dxt};
use super::{DecodeError, FaceDecoder};
use crate::face::FaceSource;

const SIGNATURE: &[u8; 4] = b"VTF\0";
const FLAG_ENVMAP: u32 = 0x4000;
const RESOURCE_HIGH_RES: [u8; 3] = [0x30, 0, 0];
const RESOURCE_ENTRY_BYTES: usize = 8;
const RESOURCE_TABLE_OFFSET: usize = 80;
/// A 65535-pixel side has 17 levels; anything beyond that is corrupt.
const MAX_MIP_LEVELS: u32 = 17;

/// Decoder for `.vtf` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct VtfDecoder;

impl FaceDecoder for VtfDecoder {
    fn decode(&self, source: &FaceSource) -> Result<RgbaImage, DecodeError> {
        let bytes = std::fs::read(&source.path)?;
        decode_vtf(&bytes)
    }
}

/// Pixel formats a VTF image can be stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VtfFormat {
    /// 8-bit RGBA, id 0.
    Rgba8888,
    /// 8-bit ABGR.
    Abgr8888,
    /// 8-bit RGB, opaque.
    Rgb888,
    /// 8-bit BGR, opaque.
    Bgr888,
    /// Packed 5:6:5 RGB.
    Rgb565,
    /// 8-bit luminance.
    I8,
    /// 8-bit luminance plus alpha.
    Ia88,
    /// Paletted; not decoded.
    P8,
    /// Alpha only, black color.
    A8,
    /// RGB where pure blue means transparent.
    Rgb888Bluescreen,
    /// BGR where pure blue means transparent.
    Bgr888Bluescreen,
    /// 8-bit ARGB.
    Argb8888,
    /// 8-bit BGRA.
    Bgra8888,
    /// BC1 blocks, opaque.
    Dxt1,
    /// BC2 blocks with explicit 4-bit alpha.
    Dxt3,
    /// BC3 blocks with interpolated alpha.
    Dxt5,
    /// 8-bit BGR with an unused fourth byte.
    Bgrx8888,
    /// Packed 5:6:5 BGR.
    Bgr565,
    /// Packed 5:5:5 BGR with an unused bit.
    Bgrx5551,
    /// Packed 4:4:4:4 BGRA.
    Bgra4444,
    /// BC1 blocks with punch-through alpha.
    Dxt1OneBitAlpha,
    /// Packed 5:5:5 BGR with a 1-bit alpha.
    Bgra5551,
    /// Two-channel normal data, written to red and green.
    Uv88,
    /// Four-channel normal data; not decoded.
    Uvwq8888,
    /// Half-float RGBA; not decoded.
    Rgba16161616F,
    /// 16-bit integer RGBA; not decoded.
    Rgba16161616,
    /// Four-channel normal data; not decoded.
    Uvlx8888,
}

impl VtfFormat {
    /// Map an on-disk format id. `-1` (no image) and unknown ids return `None`.
    #[must_use]
    pub fn from_id(id: i32) -> Option<Self> {
        use VtfFormat::*;
        const TABLE: [VtfFormat; 27] = [
            Rgba8888,
            Abgr8888,
            Rgb888,
            Bgr888,
            Rgb565,
            I8,
            Ia88,
            P8,
            A8,
            Rgb888Bluescreen,
            Bgr888Bluescreen,
            Argb8888,
            Bgra8888,
            Dxt1,
            Dxt3,
            Dxt5,
            Bgrx8888,
            Bgr565,
            Bgrx5551,
            Bgra4444,
            Dxt1OneBitAlpha,
            Bgra5551,
            Uv88,
            Uvwq8888,
            Rgba16161616F,
            Rgba16161616,
            Uvlx8888,
        ];
        usize::try_from(id).ok().and_then(|i| TABLE.get(i).copied())
    }

    /// Upper-case name, as used by Valve tooling.
    #[must_use]
    pub fn name(self) -> &'static str {
        use VtfFormat::*;
        match self {
            Rgba8888 => "RGBA8888",
            Abgr8888 => "ABGR8888",
            Rgb888 => "RGB888",
            Bgr888 => "BGR888",
            Rgb565 => "RGB565",
            I8 => "I8",
            Ia88 => "IA88",
            P8 => "P8",
            A8 => "A8",
            Rgb888Bluescreen => "RGB888_BLUESCREEN",
            Bgr888Bluescreen => "BGR888_BLUESCREEN",
            Argb8888 => "ARGB8888",
            Bgra8888 => "BGRA8888",
            Dxt1 => "DXT1",
            Dxt3 => "DXT3",
            Dxt5 => "DXT5",
            Bgrx8888 => "BGRX8888",
            Bgr565 => "BGR565",
            Bgrx5551 => "BGRX5551",
            Bgra4444 => "BGRA4444",
            Dxt1OneBitAlpha => "DXT1_ONEBITALPHA",
            Bgra5551 => "BGRA5551",
            Uv88 => "UV88",
            Uvwq8888 => "UVWQ8888",
            Rgba16161616F => "RGBA16161616F",
            Rgba16161616 => "RGBA16161616",
            Uvlx8888 => "UVLX8888",
        }
    }

    fn dxt(self) -> Option<Dxt> {
        match self {
            VtfFormat::Dxt1 => Some(Dxt::Dxt1),
            VtfFormat::Dxt1OneBitAlpha => Some(Dxt::Dxt1OneBitAlpha),
            VtfFormat::Dxt3 => Some(Dxt::Dxt3),
            VtfFormat::Dxt5 => Some(Dxt::Dxt5),
            _ => None,
        }
    }

    fn bytes_per_pixel(self) -> usize {
        use VtfFormat::*;
        match self {
            I8 | P8 | A8 => 1,
            Ia88 | Rgb565 | Bgr565 | Bgrx5551 | Bgra4444 | Bgra5551 | Uv88 => 2,
            Rgb888 | Bgr888 | Rgb888Bluescreen | Bgr888Bluescreen => 3,
            Rgba8888 | Abgr8888 | Argb8888 | Bgra8888 | Bgrx8888 | Uvwq8888 | Uvlx8888 => 4,
            Rgba16161616F | Rgba16161616 => 8,
            Dxt1 | Dxt1OneBitAlpha | Dxt3 | Dxt5 => 0,
        }
    }

    /// Stored size of one `width × height` image.
    #[must_use]
    pub fn image_bytes(self, width: u32, height: u32) -> usize {
        match self.dxt() {
            Some(dxt) => dxt.image_bytes(width, height),
            None => width as usize * height as usize * self.bytes_per_pixel(),
        }
    }

    /// Convert one uncompressed texel to RGBA. `None` if this crate does not
    /// decode the format.
    fn texel(self, p: &[u8]) -> Option<[u8; 4]> {
        use VtfFormat::*;
        let word = || u16::from_le_bytes([p[0], p[1]]);
        let bits5 = |v: u16| ((v & 0x1F) as u8) << 3 | ((v & 0x1F) as u8) >> 2;
        let bits4 = |v: u16| ((v & 0xF) as u8) * 17;
        let texel = match self {
            Rgba8888 => [p[0], p[1], p[2], p[3]],
            Abgr8888 => [p[3], p[2], p[1], p[0]],
            Argb8888 => [p[1], p[2], p[3], p[0]],
            Bgra8888 => [p[2], p[1], p[0], p[3]],
            Bgrx8888 => [p[2], p[1], p[0], 255],
            Rgb888 => [p[0], p[1], p[2], 255],
            Bgr888 => [p[2], p[1], p[0], 255],
            Rgb888Bluescreen => bluescreen([p[0], p[1], p[2]]),
            Bgr888Bluescreen => bluescreen([p[2], p[1], p[0]]),
            I8 => [p[0], p[0], p[0], 255],
            Ia88 => [p[0], p[0], p[0], p[1]],
            A8 => [0, 0, 0, p[0]],
            Uv88 => [p[0], p[1], 0, 255],
            Rgb565 => {
                let [r, g, b] = dxt::rgb565(word());
                [r, g, b, 255]
            }
            Bgr565 => {
                let [b, g, r] = dxt::rgb565(word());
                [r, g, b, 255]
            }
            Bgra4444 => {
                let w = word();
                [bits4(w >> 8), bits4(w >> 4), bits4(w), bits4(w >> 12)]
            }
            Bgra5551 | Bgrx5551 => {
                let w = word();
                let alpha = if self == Bgrx5551 || w & 0x8000 != 0 { 255 } else { 0 };
                [bits5(w >> 10), bits5(w >> 5), bits5(w), alpha]
            }
            _ => return None,
        };
        Some(texel)
    }

    fn is_supported(self) -> bool {
        self.dxt().is_some() || self.texel(&[0; 8]).is_some()
    }
}

/// Pure blue marks transparency in the blue-screen formats.
fn bluescreen([r, g, b]: [u8; 3]) -> [u8; 4] {
    if r == 0 && g == 0 && b == 255 {
        [0, 0, 0, 0]
    } else {
        [r, g, b, 255]
    }
}

/// Parsed VTF header fields needed to locate the top mip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VtfHeader {
    /// `(major, minor)`; only 7.0 to 7.5 are accepted.
    pub version: (u32, u32),
    /// Bytes before the thumbnail in pre-7.3 files.
    pub header_size: u32,
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Texture flags; only the environment-map bit is used here.
    pub flags: u32,
    /// Animation frames, at least 1.
    pub frames: u32,
    /// First animation frame. `0xFFFF` drops the sphere-map face of old envmaps.
    pub first_frame: u16,
    /// Raw high-resolution format id, see [`VtfFormat::from_id`].
    pub format_id: i32,
    /// Mip levels stored, at least 1.
    pub mip_count: u32,
    /// Raw thumbnail format id, `-1` when absent.
    pub low_res_format_id: i32,
    /// Thumbnail width in pixels.
    pub low_res_width: u32,
    /// Thumbnail height in pixels.
    pub low_res_height: u32,
    /// Volume slices, at least 1.
    pub depth: u32,
}

impl VtfHeader {
    /// Parse the fixed header at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Malformed`] for a bad signature or truncated header.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < 63 || &bytes[..4] != SIGNATURE {
            return Err(DecodeError::Malformed("missing VTF signature".to_string()));
        }
        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u32_at = |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        let i32_at = |o: usize| u32_at(o) as i32;

        let version = (u32_at(4), u32_at(8));
        if version.0 != 7 || version.1 > 5 {
            return Err(DecodeError::Malformed(format!(
                "unsupported VTF version {}.{}",
                version.0, version.1
            )));
        }
        let mip_count = u32::from(bytes[56]).max(1);
        if mip_count > MAX_MIP_LEVELS {
            return Err(DecodeError::Malformed(format!(
                "mip count {mip_count} exceeds {MAX_MIP_LEVELS}"
            )));
        }
        let depth = if version.1 >= 2 && bytes.len() >= 65 {
            u32::from(u16_at(63)).max(1)
        } else {
            1
        };

        Ok(Self {
            version,
            header_size: u32_at(12),
            width: u32::from(u16_at(16)),
            height: u32::from(u16_at(18)),
            flags: u32_at(20),
            frames: u32::from(u16_at(24)).max(1),
            first_frame: u16_at(26),
            format_id: i32_at(52),
            mip_count,
            low_res_format_id: i32_at(57),
            low_res_width: u32::from(bytes[61]),
            low_res_height: u32::from(bytes[62]),
            depth,
        })
    }

    /// Number of faces per frame (6 or 7 for environment maps).
    #[must_use]
    pub fn faces(&self) -> u32 {
        if self.flags & FLAG_ENVMAP == 0 {
            1
        } else if self.version.1 < 5 && self.first_frame != 0xFFFF {
            7
        } else {
            6
        }
    }

    fn mip_dimensions(&self, level: u32) -> (u32, u32) {
        let shrink = |side: u32| side.checked_shr(level).unwrap_or(0).max(1);
        (shrink(self.width), shrink(self.height))
    }

    /// Images stored per mip level: frames × faces × slices.
    fn images_per_mip(&self) -> Option<usize> {
        let frames = usize::try_from(self.frames).ok()?;
        let faces = usize::try_from(self.faces()).ok()?;
        let depth = usize::try_from(self.depth).ok()?;
        frames.checked_mul(faces)?.checked_mul(depth)
    }
}

/// Decode the full-resolution image from an in-memory VTF file.
///
/// # Errors
///
/// [`DecodeError::UnsupportedCompression`] for formats this crate does not
/// decode, [`DecodeError::Malformed`] for inconsistent files.
pub fn decode_vtf(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let header = VtfHeader::parse(bytes)?;
    let format = VtfFormat::from_id(header.format_id).ok_or_else(|| {
        DecodeError::Malformed(format!("unknown image format id {}", header.format_id))
    })?;
    if !format.is_supported() {
        return Err(DecodeError::UnsupportedCompression {
            name: format.name(),
            id: header.format_id,
        });
    }
    if header.width == 0 || header.height == 0 {
        return Err(DecodeError::Empty {
            width: header.width,
            height: header.height,
        });
    }

    let data_start = high_res_offset(&header, bytes)?;

    // Mips are stored smallest first; the full-size image comes last.
    let overflow = || DecodeError::Malformed("image data size overflows".to_string());
    let per_mip_images = header.images_per_mip().ok_or_else(overflow)?;
    let mut offset = data_start;
    for level in (1..header.mip_count).rev() {
        let (w, h) = header.mip_dimensions(level);
        offset = format
            .image_bytes(w, h)
            .checked_mul(per_mip_images)
            .and_then(|block| offset.checked_add(block))
            .ok_or_else(overflow)?;
    }

    // Frame 0, face 0, slice 0 opens the last block, which must be complete.
    let size = format.image_bytes(header.width, header.height);
    let block_end = size
        .checked_mul(per_mip_images)
        .and_then(|block| offset.checked_add(block))
        .ok_or_else(overflow)?;
    if block_end > bytes.len() {
        return Err(DecodeError::Malformed(format!(
            "image data starting at {offset} needs {} more bytes than the file holds ({} bytes)",
            block_end - bytes.len(),
            bytes.len()
        )));
    }
    let end = offset + size;
    let data = &bytes[offset..end];

    log::debug!(
        "VTF {}.{} {}x{} {} ({} mips)",
        header.version.0,
        header.version.1,
        header.width,
        header.height,
        format.name(),
        header.mip_count
    );

    match format.dxt() {
        Some(dxt) => dxt::decompress(dxt, data, header.width, header.height),
        None => {
            let bpp = format.bytes_per_pixel();
            let mut image = RgbaImage::new(header.width, header.height);
            for (pixel, chunk) in image.pixels_mut().zip(data.chunks_exact(bpp)) {
                // is_supported() guarantees a texel conversion exists.
                *pixel = Rgba(format.texel(chunk).unwrap_or([0, 0, 0, 0]));
            }
            Ok(image)
        }
    }
}

/// Byte offset of the high-resolution image block.
fn high_res_offset(header: &VtfHeader, bytes: &[u8]) -> Result<usize, DecodeError> {
    if header.version.1 >= 3 {
        if bytes.len() < RESOURCE_TABLE_OFFSET {
            return Err(DecodeError::Malformed("truncated resource header".to_string()));
        }
        let count = u32::from_le_bytes([bytes[68], bytes[69], bytes[70], bytes[71]]) as usize;
        for i in 0..count {
            let at = RESOURCE_TABLE_OFFSET + i * RESOURCE_ENTRY_BYTES;
            let entry = bytes.get(at..at + RESOURCE_ENTRY_BYTES).ok_or_else(|| {
                DecodeError::Malformed("resource table runs past end of file".to_string())
            })?;
            if entry[..3] == RESOURCE_HIGH_RES {
                return Ok(u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]) as usize);
            }
        }
        return Err(DecodeError::Malformed("no high-res image resource".to_string()));
    }

    let low_res_bytes = match VtfFormat::from_id(header.low_res_format_id) {
        Some(low) if header.low_res_width > 0 && header.low_res_height > 0 => {
            low.image_bytes(header.low_res_width, header.low_res_height)
        }
        _ => 0,
    };
    usize::try_from(header.header_size)
        .ok()
        .and_then(|start| start.checked_add(low_res_bytes))
        .ok_or_else(|| DecodeError::Malformed("header size overflows".to_string()))
}
