//! Fixed-point scalars and vectors
//!
//! Everything is 4.12: `ONE` (4096) stands for 1.0, and a full turn is 4096
//! angle units. Products are formed in a wider integer and narrowed with an
//! arithmetic right shift, so rounding is always toward negative infinity.

use std::ops::{Add, Neg, Sub};
use serde::{Deserialize, Serialize};

/// Fractional bits of every fixed-point value in the pipeline
pub const FRAC_BITS: u32 = 12;

/// 1.0 in 4.12
pub const ONE: i32 = 1 << FRAC_BITS;

/// Angle units per full turn
pub const FULL_TURN: i32 = 4096;

/// Short vector: model-space vertices, normals and Euler angles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SVec3 {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl SVec3 {
    pub const ZERO: SVec3 = SVec3 { x: 0, y: 0, z: 0 };

    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Dot product in full precision (no shift applied)
    pub fn dot(self, other: SVec3) -> i64 {
        self.x as i64 * other.x as i64
            + self.y as i64 * other.y as i64
            + self.z as i64 * other.z as i64
    }

    pub fn widen(self) -> Vec3i {
        Vec3i::new(self.x as i32, self.y as i32, self.z as i32)
    }
}

/// Long vector: translations and camera-space positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3i {
    pub const ZERO: Vec3i = Vec3i { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Truncate to a short vector (wrapping, like the hardware registers)
    pub fn narrow(self) -> SVec3 {
        SVec3::new(self.x as i16, self.y as i16, self.z as i16)
    }
}

impl Add for Vec3i {
    type Output = Vec3i;
    fn add(self, other: Vec3i) -> Vec3i {
        Vec3i {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }
}

impl Sub for Vec3i {
    type Output = Vec3i;
    fn sub(self, other: Vec3i) -> Vec3i {
        Vec3i {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
            z: self.z.wrapping_sub(other.z),
        }
    }
}

impl Neg for Vec3i {
    type Output = Vec3i;
    fn neg(self) -> Vec3i {
        Vec3i {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
            z: self.z.wrapping_neg(),
        }
    }
}

/// 8-bit RGB triple (vertex colours, lit colours, primitive colours)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    /// Neutral colour: 128 is 1.0 for texture modulation
    pub const GRAY: Rgb = Rgb { r: 128, g: 128, b: 128 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Average brightness, integer division
    pub fn average(self) -> i32 {
        (self.r as i32 + self.g as i32 + self.b as i32) / 3
    }

    /// Add the same amount to every channel, saturating at 255
    pub fn brighten(self, amount: i32) -> Self {
        let add = |c: u8| (c as i32 + amount).clamp(0, 255) as u8;
        Self::new(add(self.r), add(self.g), add(self.b))
    }

    /// Subtract the same amount from every channel, floored at 0
    pub fn darken(self, amount: i32) -> Self {
        let sub = |c: u8| (c as i32 - amount).clamp(0, 255) as u8;
        Self::new(sub(self.r), sub(self.g), sub(self.b))
    }
}

/// Fixed-point sine, 4096 units per turn, 4.12 result
///
/// Third-order polynomial over a quarter wave. Exact at the quadrant points
/// and within 16 LSB elsewhere; any input angle is accepted.
pub fn isin(angle: i32) -> i32 {
    const QN: u32 = 10;
    const QA: u32 = 12;
    const B: i32 = 19900;
    const C: i32 = 3516;

    // Bit 31 of `c` carries the half-turn the angle lies in.
    let c = angle.wrapping_shl(30 - QN);
    let mut x = angle.wrapping_sub(1 << QN);
    x = x.wrapping_shl(31 - QN) >> (31 - QN);
    x = x.wrapping_mul(x) >> (2 * QN - 14);
    let y = B - (x.wrapping_mul(C) >> 14);
    let y = (1 << QA) - (x.wrapping_mul(y) >> 16);

    if c >= 0 {
        y
    } else {
        -y
    }
}

/// Fixed-point cosine, see [`isin`]
pub fn icos(angle: i32) -> i32 {
    isin(angle.wrapping_add(FULL_TURN / 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_quadrants_exact() {
        assert_eq!(isin(0), 0);
        assert_eq!(isin(1024), ONE);
        assert_eq!(isin(2048), 0);
        assert_eq!(isin(3072), -ONE);
        assert_eq!(icos(0), ONE);
        assert_eq!(icos(2048), -ONE);
    }

    #[test]
    fn test_sine_wraps_any_angle() {
        assert_eq!(isin(4096 + 1024), isin(1024));
        assert_eq!(isin(-1024), -ONE);
        assert_eq!(isin(512), -isin(-512));
    }

    #[test]
    fn test_sine_accuracy() {
        for a in (0..4096).step_by(37) {
            let expected = (a as f64 / 4096.0 * std::f64::consts::TAU).sin() * 4096.0;
            let got = isin(a) as f64;
            assert!((got - expected).abs() < 16.0, "angle {}: {} vs {}", a, got, expected);
        }
    }

    #[test]
    fn test_dot_does_not_overflow() {
        let big = SVec3::new(i16::MAX, i16::MAX, i16::MAX);
        assert_eq!(big.dot(big), 3 * 32767 * 32767);
        let min = SVec3::new(i16::MIN, i16::MIN, i16::MIN);
        assert_eq!(min.dot(min), 3 * 32768 * 32768);
        assert_eq!(SVec3::new(4096, 0, 0).dot(SVec3::new(-4096, 5, 5)), -4096 * 4096);
    }

    #[test]
    fn test_rgb_saturation() {
        let c = Rgb::new(250, 10, 128);
        assert_eq!(c.brighten(10), Rgb::new(255, 20, 138));
        assert_eq!(c.darken(20), Rgb::new(230, 0, 108));
        assert_eq!(Rgb::new(60, 60, 60).average(), 60);
    }
}
