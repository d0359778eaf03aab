//! S3TC block decompression (DXT1, DXT3, DXT5).
//!
//! Each 4×4 texel block decodes independently; blocks are stored row-major.

use image::{Rgba, RgbaImage};

use super::DecodeError;

/// S3TC variants found in VTF files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dxt {
    /// Opaque BC1; the 3-colour mode's fourth entry is black.
    Dxt1,
    /// BC1 where the 3-colour mode's fourth entry is transparent.
    Dxt1OneBitAlpha,
    /// BC2: explicit 4-bit alpha.
    Dxt3,
    /// BC3: interpolated alpha.
    Dxt5,
}

impl Dxt {
    pub(crate) fn block_bytes(self) -> usize {
        match self {
            Dxt::Dxt1 | Dxt::Dxt1OneBitAlpha => 8,
            Dxt::Dxt3 | Dxt::Dxt5 => 16,
        }
    }

    /// Compressed size of a `width × height` image.
    pub(crate) fn image_bytes(self, width: u32, height: u32) -> usize {
        let bw = width.div_ceil(4).max(1) as usize;
        let bh = height.div_ceil(4).max(1) as usize;
        bw * bh * self.block_bytes()
    }

    fn decode_block(self, block: &[u8]) -> [[u8; 4]; 16] {
        match self {
            Dxt::Dxt1 => color_block(block, false, false),
            Dxt::Dxt1OneBitAlpha => color_block(block, false, true),
            Dxt::Dxt3 => {
                let mut texels = color_block(&block[8..], true, false);
                let bits = u64::from_le_bytes(block[..8].try_into().unwrap_or([0; 8]));
                for (i, texel) in texels.iter_mut().enumerate() {
                    let a4 = ((bits >> (4 * i)) & 0xF) as u8;
                    texel[3] = a4 * 17;
                }
                texels
            }
            Dxt::Dxt5 => {
                let mut texels = color_block(&block[8..], true, false);
                let alphas = alpha_palette(block[0], block[1]);
                let mut raw = [0u8; 8];
                raw[..6].copy_from_slice(&block[2..8]);
                let bits = u64::from_le_bytes(raw);
                for (i, texel) in texels.iter_mut().enumerate() {
                    texel[3] = alphas[((bits >> (3 * i)) & 0x7) as usize];
                }
                texels
            }
        }
    }
}

/// Decompress `data` into a `width × height` RGBA image.
pub(crate) fn decompress(
    format: Dxt,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<RgbaImage, DecodeError> {
    let expected = format.image_bytes(width, height);
    if data.len() < expected {
        return Err(DecodeError::Malformed(format!(
            "{format:?} payload is {} bytes, {width}x{height} needs {expected}",
            data.len()
        )));
    }

    let blocks_wide = width.div_ceil(4).max(1);
    let mut image = RgbaImage::new(width, height);
    for (index, block) in data[..expected]
        .chunks_exact(format.block_bytes())
        .enumerate()
    {
        let bx = index as u32 % blocks_wide;
        let by = index as u32 / blocks_wide;
        let texels = format.decode_block(block);
        for (i, texel) in texels.iter().enumerate() {
            let x = bx * 4 + i as u32 % 4;
            let y = by * 4 + i as u32 / 4;
            if x < width && y < height {
                image.put_pixel(x, y, Rgba(*texel));
            }
        }
    }
    Ok(image)
}

/// Expand a packed RGB565 value to 8 bits per channel.
pub(crate) fn rgb565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn color_block(block: &[u8], four_color: bool, one_bit_alpha: bool) -> [[u8; 4]; 16] {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);

    let [r0, g0, b0] = rgb565(c0).map(u16::from);
    let [r1, g1, b1] = rgb565(c1).map(u16::from);
    let mix = |a: u16, b: u16, wa: u16, wb: u16| ((a * wa + b * wb) / (wa + wb)) as u8;

    let mut palette = [[0u8; 4]; 4];
    palette[0] = [r0 as u8, g0 as u8, b0 as u8, 255];
    palette[1] = [r1 as u8, g1 as u8, b1 as u8, 255];
    if four_color || c0 > c1 {
        palette[2] = [mix(r0, r1, 2, 1), mix(g0, g1, 2, 1), mix(b0, b1, 2, 1), 255];
        palette[3] = [mix(r0, r1, 1, 2), mix(g0, g1, 1, 2), mix(b0, b1, 1, 2), 255];
    } else {
        palette[2] = [mix(r0, r1, 1, 1), mix(g0, g1, 1, 1), mix(b0, b1, 1, 1), 255];
        palette[3] = [0, 0, 0, if one_bit_alpha { 0 } else { 255 }];
    }

    std::array::from_fn(|i| palette[((indices >> (2 * i)) & 0x3) as usize])
}

fn alpha_palette(a0: u8, a1: u8) -> [u8; 8] {
    let (a0w, a1w) = (u16::from(a0), u16::from(a1));
    let lerp = |w0: u16, w1: u16, d: u16| ((a0w * w0 + a1w * w1) / d) as u8;
    if a0 > a1 {
        [
            a0,
            a1,
            lerp(6, 1, 7),
            lerp(5, 2, 7),
            lerp(4, 3, 7),
            lerp(3, 4, 7),
            lerp(2, 5, 7),
            lerp(1, 6, 7),
        ]
    } else {
        [
            a0,
            a1,
            lerp(4, 1, 5),
            lerp(3, 2, 5),
            lerp(2, 3, 5),
            lerp(1, 4, 5),
            0,
            255,
        ]
    }
}
