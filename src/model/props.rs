//! Built-in demo assets
//!
//! Procedurally generated stand-ins for the viewer scene: an animated
//! character, a ground plane, a moon, a spinning coin and a spinning star,
//! plus small textures for each. Quads are wound so that, seen from outside,
//! vertex 0 is top-left, 1 top-right, 2 bottom-left and 3 bottom-right.

use super::animation::{AnimTrack, AnimationSet};
use super::data::{MaterialFlags, ModelData};
use super::loader::ModelAsset;
use crate::gpu::{pack_rgb15, TimError, TimImage, Uv};
use crate::gte::{icos, isin, Rgb, SVec3, Vec3i, FULL_TURN, ONE};

/// Per-face attributes recorded by the builder
#[derive(Debug, Clone, Copy, Default)]
struct Material {
    flags: MaterialFlags,
    mesh: u8,
    specular: u8,
    metallic: u8,
}

#[derive(Default)]
struct Builder {
    verts: Vec<SVec3>,
    normals: Vec<SVec3>,
    colors: Vec<Rgb>,
    uvs: Vec<Uv>,
    /// Animation part of each vertex
    parts: Vec<u8>,
    tris: Vec<[u16; 3]>,
    quads: Vec<[u16; 4]>,
    tri_mats: Vec<Material>,
    quad_mats: Vec<Material>,
}

const QUAD_UV: [Uv; 4] = [Uv::new(0, 0), Uv::new(63, 0), Uv::new(0, 63), Uv::new(63, 63)];

impl Builder {
    fn vertex(&mut self, p: Vec3i, n: SVec3, c: Rgb, uv: Uv, part: u8) -> u16 {
        self.verts.push(p.narrow());
        self.normals.push(n);
        self.colors.push(c);
        self.uvs.push(uv);
        self.parts.push(part);
        (self.verts.len() - 1) as u16
    }

    /// Quad spanning `tl`, `tl + right`, `tl + down`, `tl + right + down`
    fn quad(&mut self, tl: Vec3i, right: Vec3i, down: Vec3i, normal: SVec3, color: Rgb, part: u8, mat: Material) {
        let corners = [tl, tl + right, tl + down, tl + right + down];
        let mut idx = [0u16; 4];
        for (i, p) in corners.into_iter().enumerate() {
            idx[i] = self.vertex(p, normal, color, QUAD_UV[i], part);
        }
        self.quads.push(idx);
        self.quad_mats.push(mat);
    }

    fn tri(&mut self, idx: [u16; 3], mat: Material) {
        self.tris.push(idx);
        self.tri_mats.push(mat);
    }

    /// Axis-aligned box with outward-facing quads
    fn cuboid(&mut self, min: Vec3i, max: Vec3i, color: Rgb, part: u8, mat: Material) {
        let (sx, sy, sz) = (max.x - min.x, max.y - min.y, max.z - min.z);
        let v = Vec3i::new;
        let n = SVec3::new;
        let one = ONE as i16;
        let faces = [
            (v(min.x, min.y, min.z), v(sx, 0, 0), v(0, sy, 0), n(0, 0, -one)),
            (v(max.x, min.y, max.z), v(-sx, 0, 0), v(0, sy, 0), n(0, 0, one)),
            (v(min.x, min.y, max.z), v(0, 0, -sz), v(0, sy, 0), n(-one, 0, 0)),
            (v(max.x, min.y, min.z), v(0, 0, sz), v(0, sy, 0), n(one, 0, 0)),
            (v(min.x, min.y, max.z), v(sx, 0, 0), v(0, 0, -sz), n(0, -one, 0)),
            (v(min.x, max.y, min.z), v(sx, 0, 0), v(0, 0, sz), n(0, one, 0)),
        ];
        for (tl, right, down, normal) in faces {
            self.quad(tl, right, down, normal, color, part, mat);
        }
    }

    fn finish(self, name: &str) -> (ModelAsset, Vec<u8>) {
        let mats: Vec<Material> = self.tri_mats.iter().chain(&self.quad_mats).copied().collect();
        let any = |f: MaterialFlags| mats.iter().any(|m| m.flags.contains(f));

        let model = ModelData {
            tri_uvs: self.tris.clone(),
            tri_faces: self.tris,
            quad_uvs: self.quads.clone(),
            quad_faces: self.quads,
            uvs: self.uvs,
            normals: self.normals,
            vertex_colors: Some(self.colors),
            material_flags: mats.iter().map(|m| m.flags).collect(),
            specular: any(MaterialFlags::SPECULAR).then(|| mats.iter().map(|m| m.specular).collect()),
            metallic: any(MaterialFlags::METALLIC).then(|| mats.iter().map(|m| m.metallic).collect()),
            mesh_ids: mats.iter().any(|m| m.mesh != 0).then(|| mats.iter().map(|m| m.mesh).collect()),
            ..Default::default()
        };
        let asset = ModelAsset {
            name: name.to_string(),
            model,
            animation: AnimationSet {
                bind_pose: self.verts,
                tracks: Vec::new(),
            },
        };
        (asset, self.parts)
    }
}

fn scale(value: i32, sine: i32) -> i32 {
    (value * sine) >> 12
}

const BODY: u8 = 0;
const LEFT_LEG: u8 = 1;
const RIGHT_LEG: u8 = 2;
const LEFT_ARM: u8 = 3;
const RIGHT_ARM: u8 = 4;

const HIP_Y: i32 = -400;
const SHOULDER_Y: i32 = -720;
const HAND_Y: i32 = -420;

/// Blocky figure with "idle" and "walk" tracks; origin between the feet
pub fn character() -> ModelAsset {
    let mut b = Builder::default();
    let v = Vec3i::new;

    let skin = Material { flags: MaterialFlags::TEXTURED | MaterialFlags::SMOOTH, ..Default::default() };
    let shirt = Material {
        flags: MaterialFlags::VERTEX_COLOR | MaterialFlags::SMOOTH | MaterialFlags::SPECULAR,
        specular: 96,
        ..Default::default()
    };
    let limb = Material { flags: MaterialFlags::VERTEX_COLOR, mesh: 1, ..Default::default() };

    b.cuboid(v(-110, -960, -110), v(110, -740, 110), Rgb::WHITE, BODY, skin);
    b.cuboid(v(-170, -740, -90), v(170, HIP_Y, 90), Rgb::new(200, 60, 70), BODY, shirt);
    b.cuboid(v(-150, HIP_Y, -60), v(-30, 0, 60), Rgb::new(50, 60, 140), LEFT_LEG, limb);
    b.cuboid(v(30, HIP_Y, -60), v(150, 0, 60), Rgb::new(50, 60, 140), RIGHT_LEG, limb);
    b.cuboid(v(-250, SHOULDER_Y, -50), v(-170, HAND_Y, 50), Rgb::new(230, 190, 160), LEFT_ARM, limb);
    b.cuboid(v(170, SHOULDER_Y, -50), v(250, HAND_Y, 50), Rgb::new(230, 190, 160), RIGHT_ARM, limb);

    let (mut asset, parts) = b.finish("character");
    let pose = asset.animation.bind_pose.clone();

    let frames = |count: i32, f: &dyn Fn(i32, u8, SVec3) -> SVec3| -> Vec<Vec<SVec3>> {
        (0..count)
            .map(|i| {
                let phase = i * FULL_TURN / count;
                pose.iter().zip(&parts).map(|(&p, &part)| f(phase, part, p)).collect()
            })
            .collect()
    };

    let idle = frames(8, &|phase: i32, part: u8, p: SVec3| {
        let bob = scale(12, isin(phase));
        match part {
            LEFT_LEG | RIGHT_LEG => p,
            _ => SVec3::new(p.x, p.y + bob as i16, p.z),
        }
    });

    let walk = frames(12, &|phase: i32, part: u8, p: SVec3| {
        let swing = scale(90, isin(phase));
        let y = p.y as i32;
        let dz = match part {
            LEFT_LEG => swing * (y - HIP_Y) / -HIP_Y,
            RIGHT_LEG => -swing * (y - HIP_Y) / -HIP_Y,
            LEFT_ARM => -swing * (y - SHOULDER_Y) / (HAND_Y - SHOULDER_Y),
            RIGHT_ARM => swing * (y - SHOULDER_Y) / (HAND_Y - SHOULDER_Y),
            _ => 0,
        };
        let bob = match part {
            LEFT_LEG | RIGHT_LEG => 0,
            _ => -scale(16, isin(phase * 2).abs()),
        };
        SVec3::new(p.x, p.y + bob as i16, p.z + dz as i16)
    });

    asset.animation.tracks = vec![
        AnimTrack { name: "idle".to_string(), frames: idle },
        AnimTrack { name: "walk".to_string(), frames: walk },
    ];
    asset
}

/// Checkered floor on the y = 0 plane
pub fn ground() -> ModelAsset {
    const TILES: i32 = 8;
    const TILE: i32 = 400;
    let mut b = Builder::default();
    let mat = Material { flags: MaterialFlags::VERTEX_COLOR, ..Default::default() };
    let up = SVec3::new(0, -(ONE as i16), 0);
    let half = TILES * TILE / 2;

    for row in 0..TILES {
        for col in 0..TILES {
            let x0 = col * TILE - half;
            let z1 = half - row * TILE;
            let color = if (row + col) % 2 == 0 { Rgb::new(70, 110, 60) } else { Rgb::new(90, 140, 75) };
            b.quad(
                Vec3i::new(x0, 0, z1),
                Vec3i::new(TILE, 0, 0),
                Vec3i::new(0, 0, -TILE),
                up,
                color,
                BODY,
                mat,
            );
        }
    }
    b.finish("ground").0
}

/// Latitude/longitude sphere, unlit so it reads as self-illuminated
pub fn moon() -> ModelAsset {
    const LAT: i32 = 8;
    const LON: i32 = 12;
    const RADIUS: i32 = 300;
    let mut b = Builder::default();
    let mat = Material {
        flags: MaterialFlags::UNLIT | MaterialFlags::TEXTURED | MaterialFlags::SMOOTH,
        ..Default::default()
    };
    let tint = Rgb::new(128, 128, 140);

    let mut grid = vec![[0u16; (LON + 1) as usize]; (LAT + 1) as usize];
    for (i, row) in grid.iter_mut().enumerate() {
        let lat = -FULL_TURN / 4 + i as i32 * (FULL_TURN / 2) / LAT;
        let ring = scale(RADIUS, icos(lat));
        let y = scale(RADIUS, isin(lat));
        for (j, slot) in row.iter_mut().enumerate() {
            let lon = j as i32 * FULL_TURN / LON;
            let p = Vec3i::new(scale(ring, isin(lon)), y, -scale(ring, icos(lon)));
            let n = SVec3::new(
                (p.x * ONE / RADIUS) as i16,
                (p.y * ONE / RADIUS) as i16,
                (p.z * ONE / RADIUS) as i16,
            );
            let uv = Uv::new((j as i32 * 63 / LON) as u8, (i as i32 * 63 / LAT) as u8);
            *slot = b.vertex(p, n, tint, uv, BODY);
        }
    }

    for i in 0..LAT as usize {
        for j in 0..LON as usize {
            let (tl, tr) = (grid[i][j], grid[i][j + 1]);
            let (bl, br) = (grid[i + 1][j], grid[i + 1][j + 1]);
            if i == 0 {
                b.tri([tl, br, bl], mat);
            } else if i == LAT as usize - 1 {
                b.tri([tl, tr, bl], mat);
            } else {
                b.quads.push([tl, tr, bl, br]);
                b.quad_mats.push(mat);
            }
        }
    }
    b.finish("moon").0
}

/// Gold disc with a rim; specular and metallic
pub fn coin() -> ModelAsset {
    const SEGMENTS: i32 = 12;
    const RADIUS: i32 = 150;
    const HALF_DEPTH: i32 = 15;
    let mut b = Builder::default();
    let mat = Material {
        flags: MaterialFlags::TEXTURED
            | MaterialFlags::SMOOTH
            | MaterialFlags::VERTEX_COLOR
            | MaterialFlags::SPECULAR
            | MaterialFlags::METALLIC,
        specular: 180,
        metallic: 200,
        ..Default::default()
    };
    let gold = Rgb::new(220, 180, 60);
    let one = ONE as i16;

    let rim = |j: i32, z: i32| {
        let a = j * FULL_TURN / SEGMENTS;
        Vec3i::new(scale(RADIUS, isin(a)), -scale(RADIUS, icos(a)), z)
    };
    let rim_uv = |j: i32| {
        let a = j * FULL_TURN / SEGMENTS;
        Uv::new((32 + scale(31, isin(a))) as u8, (32 - scale(31, icos(a))) as u8)
    };

    for (z, normal, front) in [(-HALF_DEPTH, SVec3::new(0, 0, -one), true), (HALF_DEPTH, SVec3::new(0, 0, one), false)] {
        let centre = b.vertex(Vec3i::new(0, 0, z), normal, gold, Uv::new(32, 32), BODY);
        let ring: Vec<u16> = (0..SEGMENTS).map(|j| b.vertex(rim(j, z), normal, gold, rim_uv(j), BODY)).collect();
        for j in 0..SEGMENTS as usize {
            let (a, c) = (ring[j], ring[(j + 1) % SEGMENTS as usize]);
            b.tri(if front { [centre, a, c] } else { [centre, c, a] }, mat);
        }
    }

    for j in 0..SEGMENTS {
        let mid = j * FULL_TURN / SEGMENTS + FULL_TURN / (2 * SEGMENTS);
        let normal = SVec3::new(isin(mid) as i16, -icos(mid) as i16, 0);
        let back = rim(j, HALF_DEPTH);
        let next_back = rim(j + 1, HALF_DEPTH);
        b.quad(back, next_back - back, Vec3i::new(0, 0, -2 * HALF_DEPTH), normal, gold, BODY, mat);
    }
    b.finish("coin").0
}

/// Flat five-pointed star, two-sided, with cutout transparency
pub fn star() -> ModelAsset {
    const POINTS: i32 = 10;
    let mut b = Builder::default();
    let mat = Material {
        flags: MaterialFlags::UNLIT | MaterialFlags::TEXTURED | MaterialFlags::CUTOUT,
        ..Default::default()
    };
    let one = ONE as i16;

    for (normal, front) in [(SVec3::new(0, 0, -one), true), (SVec3::new(0, 0, one), false)] {
        let centre = b.vertex(Vec3i::ZERO, normal, Rgb::GRAY, Uv::new(32, 32), BODY);
        let ring: Vec<u16> = (0..POINTS)
            .map(|j| {
                let a = j * FULL_TURN / POINTS;
                let r = if j % 2 == 0 { 200 } else { 80 };
                let p = Vec3i::new(scale(r, isin(a)), -scale(r, icos(a)), 0);
                let uv = Uv::new((32 + p.x * 31 / 200) as u8, (32 + p.y * 31 / 200) as u8);
                b.vertex(p, normal, Rgb::GRAY, uv, BODY)
            })
            .collect();
        for j in 0..POINTS as usize {
            let (a, c) = (ring[j], ring[(j + 1) % POINTS as usize]);
            b.tri(if front { [centre, a, c] } else { [centre, c, a] }, mat);
        }
    }
    b.finish("star").0
}

/// 64x64 texture from a texel function
fn texture(f: impl Fn(i32, i32) -> u16) -> Result<TimImage, TimError> {
    let texels: Vec<u16> = (0..64).flat_map(|y| (0..64).map(move |x| (x, y))).map(|(x, y)| f(x, y)).collect();
    TimImage::from_texels(64, 64, &texels)
}

/// Face texture for the character's head
pub fn character_texture() -> Result<TimImage, TimError> {
    let skin = pack_rgb15(240, 200, 170, 255);
    let dark = pack_rgb15(40, 30, 30, 255);
    let hair = pack_rgb15(90, 50, 30, 255);
    texture(|x, y| match (x, y) {
        (_, 0..=15) => hair,
        (14..=21, 26..=33) | (42..=49, 26..=33) => dark,
        (22..=41, 46..=49) => dark,
        _ => skin,
    })
}

pub fn moon_texture() -> Result<TimImage, TimError> {
    let craters = [(12, 20, 7), (40, 14, 5), (30, 44, 9), (52, 50, 4)];
    texture(|x, y| {
        let in_crater = craters.iter().any(|&(cx, cy, r)| (x - cx).pow(2) + (y - cy).pow(2) <= r * r);
        if in_crater {
            pack_rgb15(150, 150, 160, 255)
        } else {
            pack_rgb15(210, 210, 215, 255)
        }
    })
}

pub fn coin_texture() -> Result<TimImage, TimError> {
    texture(|x, y| {
        let d2 = (x - 32).pow(2) + (y - 32).pow(2);
        match d2 {
            0..=100 => pack_rgb15(255, 230, 120, 255),
            101..=500 => pack_rgb15(230, 190, 80, 255),
            _ => pack_rgb15(200, 160, 60, 255),
        }
    })
}

/// Yellow star on transparent texels; the transparent area exercises cutout
pub fn star_texture() -> Result<TimImage, TimError> {
    texture(|x, y| {
        let d2 = (x - 32).pow(2) + (y - 32).pow(2);
        if d2 <= 28 * 28 {
            pack_rgb15(255, 220, 40, 255)
        } else {
            0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gte::{nclip, DepthScale, Gte, Matrix, ScreenXY};

    fn all() -> Vec<ModelAsset> {
        vec![character(), ground(), moon(), coin(), star()]
    }

    #[test]
    fn test_props_validate() {
        for asset in all() {
            assert!(asset.validate().is_ok(), "{} failed validation", asset.name);
        }
    }

    #[test]
    fn test_character_tracks() {
        let c = character();
        assert_eq!(c.animation.tracks.len(), 2);
        assert_eq!(c.animation.frame_count(0), 8);
        assert_eq!(c.animation.frame_count(1), 12);
        assert_eq!(c.model.mesh_ids.as_ref().map(Vec::len), Some(c.model.face_count()));
    }

    #[test]
    fn test_only_star_needs_cutout() {
        let flags: Vec<bool> = all().iter().map(|a| a.model.needs_cutout()).collect();
        assert_eq!(flags, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_box_front_faces_camera() {
        // Tilted towards the camera, a cube shows its front and top only
        let mut b = Builder::default();
        b.cuboid(Vec3i::new(-100, -100, -100), Vec3i::new(100, 100, 100), Rgb::GRAY, 0, Material::default());
        let (asset, _) = b.finish("cube");
        let mut gte = Gte::new(ScreenXY::new(160, 120), 160, DepthScale::for_table(4096));
        gte.set_matrix(Matrix::rotation_x(200).with_translation(Vec3i::new(0, 0, 1000)));

        let verts = &asset.animation.bind_pose;
        let front: Vec<usize> = asset
            .model
            .quad_faces
            .iter()
            .enumerate()
            .filter(|(_, q)| {
                let p = |i: usize| gte.rtps(&verts[q[i] as usize]).xy;
                nclip(p(0), p(1), p(2)) > 0
            })
            .map(|(i, _)| i)
            .collect();
        assert_eq!(front, vec![0, 4]);
    }
}
