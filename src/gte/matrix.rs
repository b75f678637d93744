//! Rotation matrices with translation
//!
//! A `Matrix` is the GTE's 3x3 rotation in 4.12 plus an integer translation,
//! so it behaves like a 4x4 affine transform whose last row is fixed.

use super::fixed::{icos, isin, SVec3, Vec3i, FRAC_BITS, ONE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    /// Row-major rotation, 4.12
    pub m: [[i16; 3]; 3],
    /// Translation in model units
    pub t: Vec3i,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

const O: i16 = ONE as i16;

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        m: [[O, 0, 0], [0, O, 0], [0, 0, O]],
        t: Vec3i::ZERO,
    };

    /// Rotation about the X axis
    pub fn rotation_x(angle: i32) -> Self {
        let (s, c) = (isin(angle) as i16, icos(angle) as i16);
        Self {
            m: [[O, 0, 0], [0, c, -s], [0, s, c]],
            t: Vec3i::ZERO,
        }
    }

    /// Rotation about the Y axis
    pub fn rotation_y(angle: i32) -> Self {
        let (s, c) = (isin(angle) as i16, icos(angle) as i16);
        Self {
            m: [[c, 0, s], [0, O, 0], [-s, 0, c]],
            t: Vec3i::ZERO,
        }
    }

    /// Rotation about the Z axis
    pub fn rotation_z(angle: i32) -> Self {
        let (s, c) = (isin(angle) as i16, icos(angle) as i16);
        Self {
            m: [[c, -s, 0], [s, c, 0], [0, 0, O]],
            t: Vec3i::ZERO,
        }
    }

    /// Euler rotation `Rx * Ry * Rz` (Z is applied to the vertex first)
    pub fn rotation(angles: &SVec3) -> Self {
        Self::rotation_x(angles.x as i32)
            .mul(&Self::rotation_y(angles.y as i32))
            .mul(&Self::rotation_z(angles.z as i32))
    }

    pub fn with_translation(mut self, t: Vec3i) -> Self {
        self.t = t;
        self
    }

    /// 3x3 product `self * other`; translation of `self` is kept
    pub fn mul(&self, other: &Matrix) -> Matrix {
        let mut m = [[0i16; 3]; 3];
        for (row, out) in m.iter_mut().enumerate() {
            for (col, cell) in out.iter_mut().enumerate() {
                let sum: i64 = (0..3)
                    .map(|k| self.m[row][k] as i64 * other.m[k][col] as i64)
                    .sum();
                *cell = (sum >> FRAC_BITS) as i16;
            }
        }
        Matrix { m, t: self.t }
    }

    /// Full affine composition: applying the result equals applying `other`
    /// then `self`
    pub fn compose(&self, other: &Matrix) -> Matrix {
        let mut out = self.mul(other);
        out.t = self.apply(&other.t) + self.t;
        out
    }

    /// Rotate a long vector (no translation)
    pub fn apply(&self, v: &Vec3i) -> Vec3i {
        let row = |r: &[i16; 3]| -> i32 {
            let sum = r[0] as i64 * v.x as i64 + r[1] as i64 * v.y as i64 + r[2] as i64 * v.z as i64;
            (sum >> FRAC_BITS) as i32
        };
        Vec3i::new(row(&self.m[0]), row(&self.m[1]), row(&self.m[2]))
    }

    /// Rotate a short vector (no translation)
    pub fn apply_s(&self, v: &SVec3) -> Vec3i {
        self.apply(&v.widen())
    }

    /// Rotate and translate a short vector, as the perspective transform does
    pub fn transform(&self, v: &SVec3) -> Vec3i {
        self.apply_s(v) + self.t
    }

    /// Scale each column by a 4.12 factor (scale is applied before rotation)
    pub fn scale(mut self, s: &Vec3i) -> Self {
        let factors = [s.x, s.y, s.z];
        for row in self.m.iter_mut() {
            for (cell, f) in row.iter_mut().zip(factors) {
                *cell = ((*cell as i64 * f as i64) >> FRAC_BITS) as i16;
            }
        }
        self
    }

    /// Transposed rotation; the inverse of a pure rotation
    pub fn transpose(&self) -> Matrix {
        let mut m = [[0i16; 3]; 3];
        for r in 0..3 {
            for c in 0..3 {
                m[c][r] = self.m[r][c];
            }
        }
        Matrix { m, t: self.t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let v = SVec3::new(100, -200, 300);
        let m = Matrix::IDENTITY.with_translation(Vec3i::new(1, 2, 3));
        assert_eq!(m.transform(&v), Vec3i::new(101, -198, 303));
    }

    #[test]
    fn test_quarter_turn_y() {
        let m = Matrix::rotation_y(1024);
        // +X rotates onto -Z
        assert_eq!(m.apply_s(&SVec3::new(1000, 0, 0)), Vec3i::new(0, 0, -1000));
    }

    #[test]
    fn test_euler_zero_is_identity() {
        assert_eq!(Matrix::rotation(&SVec3::ZERO), Matrix::IDENTITY);
    }

    #[test]
    fn test_compose_matches_sequential_apply() {
        let a = Matrix::rotation_x(512).with_translation(Vec3i::new(10, 20, 30));
        let b = Matrix::IDENTITY.with_translation(Vec3i::new(100, 0, -50));
        let v = SVec3::new(7, 8, 9);

        let composed = a.compose(&b).transform(&v);
        let step = b.transform(&v);
        let sequential = a.apply(&step) + a.t;
        // Rounding happens in different places, allow one unit
        assert!((composed.x - sequential.x).abs() <= 1);
        assert!((composed.y - sequential.y).abs() <= 1);
        assert!((composed.z - sequential.z).abs() <= 1);
    }

    #[test]
    fn test_rounding_is_floor() {
        let half = Matrix {
            m: [[(ONE / 2) as i16, 0, 0], [0, 0, 0], [0, 0, 0]],
            t: Vec3i::ZERO,
        };
        assert_eq!(half.apply(&Vec3i::new(-3, 0, 0)).x, -2);
        assert_eq!(half.apply(&Vec3i::new(3, 0, 0)).x, 1);
    }

    #[test]
    fn test_scale_columns() {
        let m = Matrix::IDENTITY.scale(&Vec3i::new(ONE * 2 - 1, ONE / 2, ONE));
        assert_eq!(m.apply_s(&SVec3::new(100, 100, 100)), Vec3i::new(199, 50, 100));
    }

    #[test]
    fn test_transpose_inverts_rotation() {
        let r = Matrix::rotation_z(300);
        let v = SVec3::new(1000, 500, 0);
        let back = r.transpose().apply(&r.apply_s(&v));
        // The sine approximation is not perfectly orthonormal
        assert!((back.x - 1000).abs() <= 8);
        assert!((back.y - 500).abs() <= 8);
    }
}
