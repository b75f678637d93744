//! Perspective transform, facing test and depth keys
//!
//! Mirrors the GTE's RTPS/NCLIP/AVSZ kernels in integer arithmetic.

use super::fixed::{SVec3, FRAC_BITS};
use super::matrix::Matrix;

/// Screen-space vertex position (pixels, top-left origin)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScreenXY {
    pub x: i16,
    pub y: i16,
}

impl ScreenXY {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Result of transforming one vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projected {
    pub xy: ScreenXY,
    /// Camera-space depth, clamped to `0..=0xFFFF`
    pub sz: i32,
}

/// Why a face produced no primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cull {
    /// Facing scalar <= 0: back-facing or degenerate
    BackFace,
    /// Depth key outside the ordering table, or a vertex on or behind the
    /// camera plane
    DepthRange,
}

/// Outcome of projecting a triangle or quad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceProjection {
    Culled(Cull),
    Visible {
        /// Only the first `count` entries are meaningful
        xy: [ScreenXY; 4],
        count: usize,
        otz: usize,
    },
}

/// Depth-key scale factors, 4.12 multipliers of the summed vertex depths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthScale {
    pub zsf3: i32,
    pub zsf4: i32,
}

impl DepthScale {
    /// The empirically tuned defaults: `len / 6` for triangles, `len / 8` for quads
    pub fn for_table(ot_len: usize) -> Self {
        Self {
            zsf3: (ot_len / 6) as i32,
            zsf4: (ot_len / 8) as i32,
        }
    }
}

const SZ_MAX: i32 = 0xFFFF;
const DIV_MAX: i64 = 0x1FFFF;
const XY_MIN: i32 = -1024;
const XY_MAX: i32 = 1023;

/// Geometry transformation state for the object being drawn
#[derive(Debug, Clone)]
pub struct Gte {
    /// Combined model-to-camera transform
    pub matrix: Matrix,
    /// Screen centre
    pub offset: ScreenXY,
    /// Projection plane distance
    pub h: i32,
    pub depth: DepthScale,
}

impl Gte {
    pub fn new(offset: ScreenXY, h: i32, depth: DepthScale) -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            offset,
            h,
            depth,
        }
    }

    pub fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
    }

    /// Transform one vertex into camera space and project it
    pub fn rtps(&self, v: &SVec3) -> Projected {
        let cam = self.matrix.transform(v);
        let sz = cam.z.clamp(0, SZ_MAX);

        let h = self.h as i64;
        let factor = if (sz as i64) * 2 <= h {
            DIV_MAX
        } else {
            ((h << 16) / sz as i64).min(DIV_MAX)
        };

        let sx = self.offset.x as i64 + ((cam.x as i64 * factor) >> 16);
        let sy = self.offset.y as i64 + ((cam.y as i64 * factor) >> 16);

        Projected {
            xy: ScreenXY::new(
                sx.clamp(XY_MIN as i64, XY_MAX as i64) as i16,
                sy.clamp(XY_MIN as i64, XY_MAX as i64) as i16,
            ),
            sz,
        }
    }

    /// Average depth key of a triangle
    pub fn avsz3(&self, z: [i32; 3]) -> i64 {
        (self.depth.zsf3 as i64 * z.iter().map(|&v| v as i64).sum::<i64>()) >> FRAC_BITS
    }

    /// Average depth key of a quad
    pub fn avsz4(&self, z: [i32; 4]) -> i64 {
        (self.depth.zsf4 as i64 * z.iter().map(|&v| v as i64).sum::<i64>()) >> FRAC_BITS
    }

    /// Transform a 3- or 4-vertex face and run the two culling stages
    ///
    /// The facing test looks at the first three vertices only, even for quads,
    /// and runs before the depth-range test. Any vertex with no positive depth
    /// fails the range test: its screen position is saturated garbage.
    pub fn project_face(&self, verts: &[SVec3], ot_len: usize) -> FaceProjection {
        debug_assert!(verts.len() == 3 || verts.len() == 4);

        let mut xy = [ScreenXY::default(); 4];
        let mut z = [0i32; 4];
        for (i, v) in verts.iter().take(3).enumerate() {
            let p = self.rtps(v);
            xy[i] = p.xy;
            z[i] = p.sz;
        }

        if nclip(xy[0], xy[1], xy[2]) <= 0 {
            return FaceProjection::Culled(Cull::BackFace);
        }

        let otz = if verts.len() == 4 {
            let p = self.rtps(&verts[3]);
            xy[3] = p.xy;
            z[3] = p.sz;
            self.avsz4(z)
        } else {
            self.avsz3([z[0], z[1], z[2]])
        };

        let behind = z[..verts.len()].iter().any(|&sz| sz == 0);
        if behind || otz < 0 || otz >= ot_len as i64 {
            return FaceProjection::Culled(Cull::DepthRange);
        }

        FaceProjection::Visible {
            xy,
            count: verts.len(),
            otz: otz as usize,
        }
    }
}

/// Signed doubled area of a screen triangle; positive means front-facing
pub fn nclip(a: ScreenXY, b: ScreenXY, c: ScreenXY) -> i32 {
    let (ax, ay) = (a.x as i32, a.y as i32);
    let (bx, by) = (b.x as i32, b.y as i32);
    let (cx, cy) = (c.x as i32, c.y as i32);
    (bx - ax) * (cy - ay) - (cx - ax) * (by - ay)
}
