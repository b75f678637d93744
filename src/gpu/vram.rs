//! Video memory and the fixed texture slot table
//!
//! VRAM is a 1024x512 grid of 16-bit words. Textures live in slots whose
//! positions are chosen here, not by the image files: a TIM header's own
//! coordinates are ignored on upload. There is no eviction; callers bind,
//! rebind and unbind slots explicitly.

use super::primitive::{TextureRef, Uv};
use super::tim::{PixelMode, TimImage};
use crate::gte::Rgb;
use tracing::{debug, warn};

pub const VRAM_WIDTH: usize = 1024;
pub const VRAM_HEIGHT: usize = 512;

/// Semi-transparency / mask bit of a 15-bit texel
pub const STP_BIT: u16 = 0x8000;

/// Pack 8-bit RGBA into a 15-bit texel
///
/// Transparent pixels become `0x0000`. Opaque pixels carry the STP bit so
/// black stays visible and cutout masking can tell them apart.
pub fn pack_rgb15(r: u8, g: u8, b: u8, a: u8) -> u16 {
    if a < 128 {
        return 0;
    }
    STP_BIT | (r as u16 >> 3) | ((g as u16 >> 3) << 5) | ((b as u16 >> 3) << 10)
}

pub fn unpack_rgb15(texel: u16) -> Rgb {
    let c = |shift: u16| (((texel >> shift) & 0x1F) << 3) as u8;
    Rgb::new(c(0), c(5), c(10))
}

/// Texture page id: colour mode, blend mode and 64x256 page origin
pub fn encode_tpage(mode: PixelMode, abr: u16, x: u16, y: u16) -> u16 {
    (mode.bits() << 7) | ((abr & 3) << 5) | ((y & 256) >> 4) | ((x & 1023) >> 6)
}

/// CLUT id: 16-word aligned position
pub fn encode_clut(x: u16, y: u16) -> u16 {
    (y << 6) | ((x >> 4) & 0x3F)
}

pub struct Vram {
    words: Vec<u16>,
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl Vram {
    pub fn new() -> Self {
        Self {
            words: vec![0; VRAM_WIDTH * VRAM_HEIGHT],
        }
    }

    pub fn word(&self, x: usize, y: usize) -> u16 {
        self.words[(y % VRAM_HEIGHT) * VRAM_WIDTH + (x % VRAM_WIDTH)]
    }

    /// Copy a `w`-word-wide block to `(x, y)`, wrapping at the VRAM edges
    pub fn upload(&mut self, x: u16, y: u16, w: usize, data: &[u16]) {
        if w == 0 {
            return;
        }
        for (row, line) in data.chunks(w).enumerate() {
            let vy = (y as usize + row) % VRAM_HEIGHT;
            for (col, &word) in line.iter().enumerate() {
                let vx = (x as usize + col) % VRAM_WIDTH;
                self.words[vy * VRAM_WIDTH + vx] = word;
            }
        }
    }

    /// Fetch the 15-bit texel a textured primitive sees at `uv`
    pub fn texel(&self, tex: TextureRef, uv: Uv) -> u16 {
        let page_x = (tex.tpage as usize & 0xF) * 64;
        let page_y = ((tex.tpage as usize >> 4) & 1) * 256;
        let clut_x = (tex.clut as usize & 0x3F) * 16;
        let clut_y = (tex.clut as usize >> 6) & 0x1FF;
        let (u, v) = (uv.u as usize, uv.v as usize);

        match PixelMode::from_bits((tex.tpage >> 7) & 3) {
            Some(PixelMode::Clut4) => {
                let word = self.word(page_x + u / 4, page_y + v);
                let index = (word >> ((u % 4) * 4)) & 0xF;
                self.word(clut_x + index as usize, clut_y)
            }
            Some(PixelMode::Clut8) => {
                let word = self.word(page_x + u / 2, page_y + v);
                let index = (word >> ((u % 2) * 8)) & 0xFF;
                self.word(clut_x + index as usize, clut_y)
            }
            _ => self.word(page_x + u, page_y + v),
        }
    }
}

/// Where a slot lives in VRAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub x: u16,
    pub y: u16,
    /// Capacity in words
    pub width: u16,
    pub height: u16,
    pub clut_x: u16,
    pub clut_y: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub layout: SlotLayout,
    pub tpage: u16,
    pub clut: u16,
    pub occupied: bool,
    /// Identity of the image currently uploaded here
    pub source: Option<String>,
}

impl TextureSlot {
    fn new(layout: SlotLayout) -> Self {
        Self {
            layout,
            tpage: TextureRef::NONE.tpage,
            clut: TextureRef::NONE.clut,
            occupied: false,
            source: None,
        }
    }
}

pub struct SlotTable {
    slots: Vec<TextureSlot>,
}

impl SlotTable {
    pub fn new(layouts: &[SlotLayout]) -> Self {
        Self {
            slots: layouts.iter().copied().map(TextureSlot::new).collect(),
        }
    }

    /// Four 64x256-word slots to the right of the display area, CLUT rows at
    /// the bottom of VRAM
    pub fn with_default_layout() -> Self {
        let layouts: Vec<SlotLayout> = (0..4u16)
            .map(|i| SlotLayout {
                x: 320 + i * 64,
                y: 0,
                width: 64,
                height: 256,
                clut_x: 0,
                clut_y: 480 + i,
            })
            .collect();
        Self::new(&layouts)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&TextureSlot> {
        self.slots.get(index)
    }

    /// Upload `image` into slot `index` unless `source` is already bound there
    ///
    /// Returns the slot's handles, or `TextureRef::NONE` for an unknown slot
    /// or an image that does not fit.
    pub fn bind(&mut self, index: usize, source: &str, image: &TimImage, vram: &mut Vram) -> TextureRef {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!(slot = index, "bind to unknown texture slot");
            return TextureRef::NONE;
        };

        if slot.occupied && slot.source.as_deref() == Some(source) {
            return TextureRef::new(slot.tpage, slot.clut);
        }

        let layout = slot.layout;
        if image.word_width() > layout.width as u32 || image.height > layout.height as u32 {
            warn!(
                slot = index,
                source,
                width = image.width,
                height = image.height,
                "image does not fit texture slot"
            );
            return TextureRef::NONE;
        }

        vram.upload(layout.x, layout.y, image.word_width() as usize, &image.pixels);
        slot.clut = match &image.clut {
            Some(clut) => {
                vram.upload(layout.clut_x, layout.clut_y, clut.len(), clut);
                encode_clut(layout.clut_x, layout.clut_y)
            }
            None => 0,
        };
        slot.tpage = encode_tpage(image.mode, 0, layout.x, layout.y);
        slot.occupied = true;
        slot.source = Some(source.to_string());

        debug!(slot = index, source, tpage = slot.tpage, clut = slot.clut, "bound texture");
        TextureRef::new(slot.tpage, slot.clut)
    }

    /// Mark a slot free; VRAM contents are left as they are
    pub fn unbind(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.occupied => {
                debug!(slot = index, source = slot.source.as_deref().unwrap_or(""), "unbound texture");
                *slot = TextureSlot::new(slot.layout);
                true
            }
            _ => false,
        }
    }

    /// Handles of a bound slot, `TextureRef::NONE` otherwise
    pub fn texture_ref(&self, index: usize) -> TextureRef {
        match self.slots.get(index) {
            Some(slot) if slot.occupied => TextureRef::new(slot.tpage, slot.clut),
            _ => TextureRef::NONE,
        }
    }
}
