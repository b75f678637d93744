//! Source images for VRAM texture slots
//!
//! Reads the PS1 TIM container directly and converts ordinary images (PNG,
//! BMP, JPEG) into the same in-memory shape, palettising them when the colour
//! count allows.

use super::vram::pack_rgb15;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const TIM_MAGIC: u32 = 0x10;
const TIM_HAS_CLUT: u32 = 1 << 3;

/// Largest texture addressable with 8-bit UVs
pub const MAX_TEXTURE_SIZE: u32 = 256;

#[derive(Debug, Error)]
pub enum TimError {
    #[error("TIM data truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    #[error("not a TIM image (magic {0:#x})")]
    BadMagic(u32),
    #[error("unsupported TIM pixel mode {0}")]
    UnsupportedMode(u32),
    #[error("palettised TIM without a CLUT block")]
    MissingClut,
    #[error("image is {width}x{height}, textures are limited to {max}x{max}", max = MAX_TEXTURE_SIZE)]
    Oversize { width: u32, height: u32 },
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Texel format of a texture page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelMode {
    /// 4-bit CLUT indices, four texels per VRAM word
    Clut4,
    /// 8-bit CLUT indices, two texels per VRAM word
    Clut8,
    /// 15-bit direct colour plus STP bit
    Direct15,
}

impl PixelMode {
    /// Texture page colour-mode field
    pub fn bits(self) -> u16 {
        match self {
            PixelMode::Clut4 => 0,
            PixelMode::Clut8 => 1,
            PixelMode::Direct15 => 2,
        }
    }

    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(PixelMode::Clut4),
            1 => Some(PixelMode::Clut8),
            2 => Some(PixelMode::Direct15),
            _ => None,
        }
    }

    pub fn texels_per_word(self) -> u32 {
        match self {
            PixelMode::Clut4 => 4,
            PixelMode::Clut8 => 2,
            PixelMode::Direct15 => 1,
        }
    }

    pub fn clut_entries(self) -> usize {
        match self {
            PixelMode::Clut4 => 16,
            PixelMode::Clut8 => 256,
            PixelMode::Direct15 => 0,
        }
    }
}

/// A decoded image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimImage {
    pub mode: PixelMode,
    /// Width in texels
    pub width: u32,
    pub height: u32,
    /// Packed VRAM words, `word_width() * height` of them
    pub pixels: Vec<u16>,
    pub clut: Option<Vec<u16>>,
    /// VRAM position stored in the file header; slots ignore it
    pub header_origin: (u16, u16),
    pub header_clut_origin: Option<(u16, u16)>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TimError> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(TimError::Truncated { needed: end, got: self.bytes.len() });
        }
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, TimError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, TimError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// One TIM block: length word, origin, size in words, then the words
    fn block(&mut self) -> Result<((u16, u16), u16, u16, Vec<u16>), TimError> {
        let _len = self.u32()?;
        let x = self.u16()?;
        let y = self.u16()?;
        let w = self.u16()?;
        let h = self.u16()?;
        let count = w as usize * h as usize;
        let raw = self.take(count * 2)?;
        let words = raw.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
        Ok(((x, y), w, h, words))
    }
}

impl TimImage {
    /// Word columns occupied in VRAM
    pub fn word_width(&self) -> u32 {
        self.width.div_ceil(self.mode.texels_per_word())
    }

    /// Parse a TIM file
    pub fn parse(bytes: &[u8]) -> Result<Self, TimError> {
        let mut r = Reader { bytes, pos: 0 };
        let magic = r.u32()?;
        if magic != TIM_MAGIC {
            return Err(TimError::BadMagic(magic));
        }
        let flags = r.u32()?;
        let mode = PixelMode::from_bits((flags & 0x7) as u16)
            .ok_or(TimError::UnsupportedMode(flags & 0x7))?;

        let (clut, header_clut_origin) = if flags & TIM_HAS_CLUT != 0 {
            let (origin, _, _, words) = r.block()?;
            (Some(words), Some(origin))
        } else {
            (None, None)
        };
        if mode != PixelMode::Direct15 && clut.is_none() {
            return Err(TimError::MissingClut);
        }

        let (header_origin, w, h, pixels) = r.block()?;
        Ok(Self {
            mode,
            width: w as u32 * mode.texels_per_word(),
            height: h as u32,
            pixels,
            clut,
            header_origin,
            header_clut_origin,
        })
    }

    /// Decode an image file, choosing the smallest pixel mode that fits
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TimError> {
        let bytes = std::fs::read(path.as_ref())?;
        if bytes.len() >= 4 && u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == TIM_MAGIC {
            return Self::parse(&bytes);
        }
        Self::from_image_bytes(&bytes)
    }

    /// Decode PNG/BMP/JPEG bytes
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, TimError> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let texels: Vec<u16> = rgba.pixels().map(|p| pack_rgb15(p[0], p[1], p[2], p[3])).collect();
        Self::from_texels(width, height, &texels)
    }

    /// Build from 15-bit texels, palettising when 256 colours or fewer are used
    pub fn from_texels(width: u32, height: u32, texels: &[u16]) -> Result<Self, TimError> {
        if width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            return Err(TimError::Oversize { width, height });
        }
        let needed = width as usize * height as usize;
        if texels.len() < needed {
            return Err(TimError::Truncated { needed: needed * 2, got: texels.len() * 2 });
        }

        let mut palette: Vec<u16> = Vec::new();
        let mut lookup: HashMap<u16, usize> = HashMap::new();
        for &t in texels {
            if !lookup.contains_key(&t) {
                lookup.insert(t, palette.len());
                palette.push(t);
                if palette.len() > 256 {
                    break;
                }
            }
        }

        let mode = match palette.len() {
            0..=16 => PixelMode::Clut4,
            17..=256 => PixelMode::Clut8,
            _ => PixelMode::Direct15,
        };
        let per_word = mode.texels_per_word();
        let word_width = width.div_ceil(per_word) as usize;
        let bits = 16 / per_word;
        let mut pixels = vec![0u16; word_width * height as usize];

        for y in 0..height as usize {
            for x in 0..width as usize {
                let t = texels[y * width as usize + x];
                let value = match mode {
                    PixelMode::Direct15 => t,
                    _ => lookup[&t] as u16,
                };
                let word = &mut pixels[y * word_width + x / per_word as usize];
                *word |= value << ((x as u32 % per_word) * bits);
            }
        }

        let clut = match mode {
            PixelMode::Direct15 => None,
            _ => {
                palette.resize(mode.clut_entries(), 0);
                Some(palette)
            }
        };

        Ok(Self {
            mode,
            width,
            height,
            pixels,
            clut,
            header_origin: (0, 0),
            header_clut_origin: None,
        })
    }
}
