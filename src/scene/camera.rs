//! Free camera driven by the pad

use super::input::{Buttons, Pad};
use crate::gte::{Matrix, SVec3, Vec3i};
use serde::{Deserialize, Serialize};

/// Rotation step per frame, in 4096-per-turn units
pub const TURN_STEP: i16 = 32;
/// Translation step per frame, in world units
pub const MOVE_STEP: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// World-space position
    pub position: Vec3i,
    /// Euler angles, 4096 per turn
    pub rotation: SVec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3i::new(0, -1200, -2800),
            rotation: SVec3::ZERO,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3i, rotation: SVec3) -> Self {
        Self { position, rotation }
    }

    /// World-to-camera transform: rotate, then offset by the rotated
    /// negated position
    pub fn view_matrix(&self) -> Matrix {
        let rot = Matrix::rotation(&self.rotation);
        let t = rot.apply(&-self.position);
        rot.with_translation(t)
    }

    /// Held-button movement; left/right turn, up/down tilt, L1/R1 dolly,
    /// L2/R2 raise and lower
    pub fn apply_input(&mut self, pad: &Pad) {
        let r = &mut self.rotation;
        if pad.held(Buttons::LEFT) {
            r.y = r.y.wrapping_add(TURN_STEP);
        }
        if pad.held(Buttons::RIGHT) {
            r.y = r.y.wrapping_sub(TURN_STEP);
        }
        if pad.held(Buttons::UP) {
            r.x = r.x.wrapping_add(TURN_STEP);
        }
        if pad.held(Buttons::DOWN) {
            r.x = r.x.wrapping_sub(TURN_STEP);
        }

        let p = &mut self.position;
        if pad.held(Buttons::L1) {
            p.z += MOVE_STEP;
        }
        if pad.held(Buttons::R1) {
            p.z -= MOVE_STEP;
        }
        if pad.held(Buttons::L2) {
            p.y -= MOVE_STEP;
        }
        if pad.held(Buttons::R2) {
            p.y += MOVE_STEP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let cam = Camera::new(Vec3i::new(100, -1200, -2800), SVec3::new(128, 300, 0));
        let view = cam.view_matrix();
        let p = cam.position;
        let at = view.apply(&p) + view.t;
        assert!(at.x.abs() <= 2 && at.y.abs() <= 2 && at.z.abs() <= 2, "{at:?}");
    }

    #[test]
    fn test_unrotated_view_is_a_translation() {
        let cam = Camera::default();
        let view = cam.view_matrix();
        assert_eq!(view.m, Matrix::IDENTITY.m);
        assert_eq!(view.transform(&SVec3::ZERO), Vec3i::new(0, 1200, 2800));
    }

    #[test]
    fn test_held_buttons_move_every_frame() {
        let mut cam = Camera::default();
        let mut pad = Pad::new();
        for _ in 0..3 {
            pad.update(Buttons::LEFT | Buttons::L1 | Buttons::R2);
            cam.apply_input(&pad);
        }
        assert_eq!(cam.rotation.y, 96);
        assert_eq!(cam.position.z, -2800 + 150);
        assert_eq!(cam.position.y, -1200 + 150);

        pad.update(Buttons::DOWN | Buttons::RIGHT | Buttons::R1 | Buttons::L2);
        cam.apply_input(&pad);
        assert_eq!(cam.rotation, SVec3::new(-32, 64, 0));
        assert_eq!(cam.position, Vec3i::new(0, -1100, -2700));
    }
}
