//! Vertex lighting and the specular/metallic post passes
//!
//! Integer only. Normals and light vectors are 4.12 unit vectors.

use crate::gte::{Matrix, Rgb, SVec3, FRAC_BITS};
use serde::{Deserialize, Serialize};

/// Fixed highlight direction used by the specular pass (above and in front)
pub const SPECULAR_LIGHT: SVec3 = SVec3::new(0, -4096, -2048);

const IR_MAX: i64 = 0x7FFF;

/// One directional light plus ambient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub ambient: Rgb,
    /// Unit vector pointing towards the light
    pub direction: SVec3,
    /// Per-channel light intensity, 4096 = 1.0
    pub color: SVec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Rgb::new(80, 80, 80),
            direction: SVec3::new(0, -3584, 1024),
            color: SVec3::new(4096, 4096, 4096),
        }
    }
}

impl Lighting {
    /// Lambert term plus ambient, scaled onto `base`
    ///
    /// `ir = ambient * 16 + color * max(L.n, 0)`, then `out = base * ir >> 12`.
    /// An `ir` of 4096 leaves the base colour unchanged.
    pub fn light_vertex(&self, normal: SVec3, base: Rgb) -> Rgb {
        let dot = (self.direction.dot(normal) >> FRAC_BITS).max(0);
        let channel = |base: u8, ambient: u8, color: i16| -> u8 {
            let ir = ((ambient as i64) << 4) + ((color as i64 * dot) >> FRAC_BITS);
            let ir = ir.clamp(0, IR_MAX) as i32;
            ((base as i32 * ir) >> FRAC_BITS).min(255) as u8
        };
        Rgb::new(
            channel(base.r, self.ambient.r, self.color.x),
            channel(base.g, self.ambient.g, self.color.y),
            channel(base.b, self.ambient.b, self.color.z),
        )
    }

    /// Express the light in an object's local frame
    ///
    /// `rotation` maps model space to world space; its transpose takes the
    /// world-space light direction back into model space, where normals live.
    pub fn to_local(&self, rotation: &Matrix) -> Lighting {
        let local = rotation.transpose().apply_s(&self.direction);
        Lighting {
            direction: local.narrow(),
            ..*self
        }
    }
}

/// Additive highlight for faces turned towards [`SPECULAR_LIGHT`]
pub fn apply_specular(color: Rgb, normal: SVec3, specular: u8) -> Rgb {
    let dot = normal.dot(SPECULAR_LIGHT) >> FRAC_BITS;
    if dot <= 0 {
        return color;
    }
    let boost = ((dot * specular as i64) >> 8).min(255) as i32;
    color.brighten(boost)
}

/// Contrast boost: bright colours get brighter, dark ones darker
///
/// A zero strength leaves the colour untouched.
pub fn apply_metallic(color: Rgb, normal: SVec3, metallic: u8) -> Rgb {
    if metallic == 0 {
        return color;
    }
    let m = metallic as i32;
    let reflect = (m * (normal.y as i32).abs()) >> FRAC_BITS;
    let avg = color.average();
    if avg > 128 {
        color.brighten((reflect * (255 - avg)) >> 8)
    } else {
        color.darken((m * avg) >> 8)
    }
}
