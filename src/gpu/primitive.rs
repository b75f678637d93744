//! Draw records stored in the primitive arena
//!
//! One variant per polygon shape and shading kind, plus the mask-mode
//! state packet. Byte sizes match the PS1 GPU packets so arena budgets
//! behave like the real primitive buffer.

use crate::gte::{Rgb, ScreenXY};
use serde::{Deserialize, Serialize};

/// Texture coordinate inside a texture page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uv {
    pub u: u8,
    pub v: u8,
}

impl Uv {
    pub const fn new(u: u8, v: u8) -> Self {
        Self { u, v }
    }
}

/// Opaque texture handles attached to textured primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub tpage: u16,
    pub clut: u16,
}

impl TextureRef {
    /// Returned for unbound or invalid VRAM slots
    pub const NONE: TextureRef = TextureRef { tpage: u16::MAX, clut: u16::MAX };

    pub const fn new(tpage: u16, clut: u16) -> Self {
        Self { tpage, clut }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// The eight polygon shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolyKind {
    F3,
    Ft3,
    G3,
    Gt3,
    F4,
    Ft4,
    G4,
    Gt4,
}

impl PolyKind {
    pub fn select(vertex_count: usize, textured: bool, smooth: bool) -> Self {
        match (vertex_count == 4, textured, smooth) {
            (false, false, false) => PolyKind::F3,
            (false, true, false) => PolyKind::Ft3,
            (false, false, true) => PolyKind::G3,
            (false, true, true) => PolyKind::Gt3,
            (true, false, false) => PolyKind::F4,
            (true, true, false) => PolyKind::Ft4,
            (true, false, true) => PolyKind::G4,
            (true, true, true) => PolyKind::Gt4,
        }
    }

    /// Packet size in bytes, tag word included
    pub fn size_bytes(self) -> usize {
        match self {
            PolyKind::F3 => 20,
            PolyKind::Ft3 => 32,
            PolyKind::G3 => 28,
            PolyKind::Gt3 => 40,
            PolyKind::F4 => 24,
            PolyKind::Ft4 => 40,
            PolyKind::G4 => 36,
            PolyKind::Gt4 => 52,
        }
    }

    pub fn vertex_count(self) -> usize {
        match self {
            PolyKind::F3 | PolyKind::Ft3 | PolyKind::G3 | PolyKind::Gt3 => 3,
            _ => 4,
        }
    }

    pub fn is_textured(self) -> bool {
        matches!(self, PolyKind::Ft3 | PolyKind::Gt3 | PolyKind::Ft4 | PolyKind::Gt4)
    }

    pub fn is_smooth(self) -> bool {
        matches!(self, PolyKind::G3 | PolyKind::Gt3 | PolyKind::G4 | PolyKind::Gt4)
    }
}

/// Texel transparency handling, switched by a mask-mode packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskMode {
    /// Only texel value zero is transparent
    Normal,
    /// Texels without the STP bit are skipped (cutout textures)
    FromSource,
}

/// Size of the mask-mode state packet
pub const MASK_PACKET_BYTES: usize = 12;

/// Texture data for textured polygons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texturing<const N: usize> {
    pub uv: [Uv; N],
    pub tex: TextureRef,
}

/// One draw record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    F3 { xy: [ScreenXY; 3], rgb: Rgb, semi_trans: bool },
    Ft3 { xy: [ScreenXY; 3], rgb: Rgb, tex: Texturing<3>, semi_trans: bool },
    G3 { xy: [ScreenXY; 3], rgb: [Rgb; 3], semi_trans: bool },
    Gt3 { xy: [ScreenXY; 3], rgb: [Rgb; 3], tex: Texturing<3>, semi_trans: bool },
    F4 { xy: [ScreenXY; 4], rgb: Rgb, semi_trans: bool },
    Ft4 { xy: [ScreenXY; 4], rgb: Rgb, tex: Texturing<4>, semi_trans: bool },
    G4 { xy: [ScreenXY; 4], rgb: [Rgb; 4], semi_trans: bool },
    Gt4 { xy: [ScreenXY; 4], rgb: [Rgb; 4], tex: Texturing<4>, semi_trans: bool },
    Mask(MaskMode),
}

/// Everything needed to build a polygon record
///
/// Slices hold one entry per vertex (3 or 4). Flat kinds take colour 0 only.
#[derive(Debug, Clone, Copy)]
pub struct PolySpec<'a> {
    pub xy: &'a [ScreenXY],
    pub rgb: &'a [Rgb],
    /// `Some` for textured faces
    pub texture: Option<(&'a [Uv], TextureRef)>,
    pub smooth: bool,
    pub semi_trans: bool,
}

fn take<T: Copy + Default, const N: usize>(src: &[T]) -> [T; N] {
    let mut out = [T::default(); N];
    for (dst, s) in out.iter_mut().zip(src) {
        *dst = *s;
    }
    out
}

impl Primitive {
    /// Build the polygon variant selected by vertex count, texturing and
    /// shading
    pub fn polygon(spec: &PolySpec) -> Primitive {
        debug_assert!(spec.xy.len() == 3 || spec.xy.len() == 4);
        debug_assert!(spec.rgb.len() >= if spec.smooth { spec.xy.len() } else { 1 });

        let kind = PolyKind::select(spec.xy.len(), spec.texture.is_some(), spec.smooth);
        let semi_trans = spec.semi_trans;
        let rgb = spec.rgb[0];
        let no_uv: &[Uv] = &[];
        let (uv, tex) = spec.texture.unwrap_or((no_uv, TextureRef::NONE));

        match kind {
            PolyKind::F3 => Primitive::F3 { xy: take(spec.xy), rgb, semi_trans },
            PolyKind::Ft3 => Primitive::Ft3 {
                xy: take(spec.xy),
                rgb,
                tex: Texturing { uv: take(uv), tex },
                semi_trans,
            },
            PolyKind::G3 => Primitive::G3 { xy: take(spec.xy), rgb: take(spec.rgb), semi_trans },
            PolyKind::Gt3 => Primitive::Gt3 {
                xy: take(spec.xy),
                rgb: take(spec.rgb),
                tex: Texturing { uv: take(uv), tex },
                semi_trans,
            },
            PolyKind::F4 => Primitive::F4 { xy: take(spec.xy), rgb, semi_trans },
            PolyKind::Ft4 => Primitive::Ft4 {
                xy: take(spec.xy),
                rgb,
                tex: Texturing { uv: take(uv), tex },
                semi_trans,
            },
            PolyKind::G4 => Primitive::G4 { xy: take(spec.xy), rgb: take(spec.rgb), semi_trans },
            PolyKind::Gt4 => Primitive::Gt4 {
                xy: take(spec.xy),
                rgb: take(spec.rgb),
                tex: Texturing { uv: take(uv), tex },
                semi_trans,
            },
        }
    }

    /// Polygon kind, `None` for state packets
    pub fn kind(&self) -> Option<PolyKind> {
        Some(match self {
            Primitive::F3 { .. } => PolyKind::F3,
            Primitive::Ft3 { .. } => PolyKind::Ft3,
            Primitive::G3 { .. } => PolyKind::G3,
            Primitive::Gt3 { .. } => PolyKind::Gt3,
            Primitive::F4 { .. } => PolyKind::F4,
            Primitive::Ft4 { .. } => PolyKind::Ft4,
            Primitive::G4 { .. } => PolyKind::G4,
            Primitive::Gt4 { .. } => PolyKind::Gt4,
            Primitive::Mask(_) => return None,
        })
    }

    pub fn size_bytes(&self) -> usize {
        self.kind().map_or(MASK_PACKET_BYTES, PolyKind::size_bytes)
    }

    pub fn is_semi_trans(&self) -> bool {
        match *self {
            Primitive::F3 { semi_trans, .. }
            | Primitive::Ft3 { semi_trans, .. }
            | Primitive::G3 { semi_trans, .. }
            | Primitive::Gt3 { semi_trans, .. }
            | Primitive::F4 { semi_trans, .. }
            | Primitive::Ft4 { semi_trans, .. }
            | Primitive::G4 { semi_trans, .. }
            | Primitive::Gt4 { semi_trans, .. } => semi_trans,
            Primitive::Mask(_) => false,
        }
    }

    /// Texture handles of textured kinds
    pub fn texture(&self) -> Option<TextureRef> {
        match self {
            Primitive::Ft3 { tex, .. } | Primitive::Gt3 { tex, .. } => Some(tex.tex),
            Primitive::Ft4 { tex, .. } | Primitive::Gt4 { tex, .. } => Some(tex.tex),
            _ => None,
        }
    }

    /// Per-vertex view used by the rasteriser: position, colour and UV
    ///
    /// Flat kinds repeat their single colour; untextured kinds report `None`
    /// for UVs. Empty for state packets.
    pub fn vertices(&self) -> Vec<(ScreenXY, Rgb, Option<Uv>)> {
        fn zip<const N: usize>(
            xy: &[ScreenXY; N],
            rgb: impl Fn(usize) -> Rgb,
            uv: Option<&[Uv; N]>,
        ) -> Vec<(ScreenXY, Rgb, Option<Uv>)> {
            (0..N).map(|i| (xy[i], rgb(i), uv.map(|uv| uv[i]))).collect()
        }

        match self {
            Primitive::F3 { xy, rgb, .. } => zip(xy, |_| *rgb, None),
            Primitive::Ft3 { xy, rgb, tex, .. } => zip(xy, |_| *rgb, Some(&tex.uv)),
            Primitive::G3 { xy, rgb, .. } => zip(xy, |i| rgb[i], None),
            Primitive::Gt3 { xy, rgb, tex, .. } => zip(xy, |i| rgb[i], Some(&tex.uv)),
            Primitive::F4 { xy, rgb, .. } => zip(xy, |_| *rgb, None),
            Primitive::Ft4 { xy, rgb, tex, .. } => zip(xy, |_| *rgb, Some(&tex.uv)),
            Primitive::G4 { xy, rgb, .. } => zip(xy, |i| rgb[i], None),
            Primitive::Gt4 { xy, rgb, tex, .. } => zip(xy, |i| rgb[i], Some(&tex.uv)),
            Primitive::Mask(_) => Vec::new(),
        }
    }
}
