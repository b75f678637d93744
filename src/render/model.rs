//! Per-face pipeline: project, cull, shade, allocate, bucket
//!
//! Faces are visited triangles first, then quads, matching the flattened
//! per-face tables. Nothing is allocated for a face until it has passed both
//! the facing test and the depth-range test.

use super::shade::{apply_metallic, apply_specular, Lighting};
use crate::gpu::{FrameSlot, MaskMode, PolySpec, Primitive, TextureRef, Uv};
use crate::gte::{Cull, FaceProjection, Gte, Rgb, SVec3};
use crate::model::{MaterialFlags, ModelData};
use std::ops::AddAssign;

/// Counters for one model or one whole frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Polygons inserted into the ordering table
    pub emitted: usize,
    /// Mask-mode state packets inserted
    pub state_packets: usize,
    pub culled_back: usize,
    pub culled_depth: usize,
    /// Faces skipped by the mesh visibility mask
    pub hidden: usize,
    /// Allocations refused by a full arena
    pub dropped: usize,
    /// Set once the arena overflowed; nothing more is emitted this frame
    pub truncated: bool,
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: Self) {
        self.emitted += rhs.emitted;
        self.state_packets += rhs.state_packets;
        self.culled_back += rhs.culled_back;
        self.culled_depth += rhs.culled_depth;
        self.hidden += rhs.hidden;
        self.dropped += rhs.dropped;
        self.truncated |= rhs.truncated;
    }
}

/// Everything a model draw needs besides the model itself
pub struct RenderCtx<'a> {
    /// Holds the object's model-to-camera transform
    pub gte: &'a Gte,
    /// Light already expressed in the object's model space
    pub lighting: &'a Lighting,
    /// Building slot of the double buffer
    pub frame: &'a mut FrameSlot,
}

impl RenderCtx<'_> {
    fn emit(&mut self, prim: Primitive, key: usize, stats: &mut FrameStats) -> bool {
        match self.frame.arena.alloc(prim) {
            Ok(handle) => {
                self.frame.ot.insert(handle, key, &mut self.frame.arena);
                true
            }
            Err(_) => {
                stats.dropped += 1;
                stats.truncated = true;
                false
            }
        }
    }
}

/// Colour of vertex `v` on a face with `flags`, before any texture
fn vertex_color(ctx: &RenderCtx, model: &ModelData, flags: MaterialFlags, face: usize, v: usize) -> Rgb {
    let base = match &model.vertex_colors {
        Some(colors) if flags.contains(MaterialFlags::VERTEX_COLOR) => colors[v],
        _ => Rgb::GRAY,
    };
    if flags.contains(MaterialFlags::UNLIT) {
        return base;
    }

    let normal = model.normals[v];
    let mut color = ctx.lighting.light_vertex(normal, base);
    if flags.contains(MaterialFlags::SPECULAR) {
        if let Some(spec) = &model.specular {
            color = apply_specular(color, normal, spec[face]);
        }
    }
    if flags.contains(MaterialFlags::METALLIC) {
        if let Some(metal) = &model.metallic {
            color = apply_metallic(color, normal, metal[face]);
        }
    }
    color
}

/// Run one triangle or quad through the pipeline; `false` stops the model
fn render_face(
    ctx: &mut RenderCtx,
    model: &ModelData,
    verts: &[SVec3],
    tex: TextureRef,
    face: usize,
    vi: &[u16],
    ui: &[u16],
    stats: &mut FrameStats,
) -> bool {
    if !model.mesh_visible(face) {
        stats.hidden += 1;
        return true;
    }

    let n = vi.len();
    let mut pos = [SVec3::ZERO; 4];
    for (slot, &v) in pos.iter_mut().zip(vi) {
        debug_assert!((v as usize) < verts.len(), "vertex index {v} out of range");
        *slot = verts[v as usize];
    }

    let (xy, otz) = match ctx.gte.project_face(&pos[..n], ctx.frame.ot.len()) {
        FaceProjection::Culled(Cull::BackFace) => {
            stats.culled_back += 1;
            return true;
        }
        FaceProjection::Culled(Cull::DepthRange) => {
            stats.culled_depth += 1;
            return true;
        }
        FaceProjection::Visible { xy, otz, .. } => (xy, otz),
    };

    let flags = model.flags(face);
    let smooth = flags.contains(MaterialFlags::SMOOTH);
    let shaded = if smooth { n } else { 1 };
    let mut rgb = [Rgb::GRAY; 4];
    for (k, color) in rgb.iter_mut().take(shaded).enumerate() {
        *color = vertex_color(ctx, model, flags, face, vi[k] as usize);
    }

    let mut uv = [Uv::default(); 4];
    let texture = if flags.contains(MaterialFlags::TEXTURED) {
        for (slot, &u) in uv.iter_mut().zip(ui) {
            debug_assert!((u as usize) < model.uvs.len(), "UV index {u} out of range");
            *slot = model.uvs[u as usize];
        }
        Some((&uv[..n], tex))
    } else {
        None
    };

    let prim = Primitive::polygon(&PolySpec {
        xy: &xy[..n],
        rgb: &rgb[..shaded],
        texture,
        smooth,
        semi_trans: flags.contains(MaterialFlags::ALPHA),
    });
    if !ctx.emit(prim, otz, stats) {
        return false;
    }
    stats.emitted += 1;
    true
}

/// Build one model's primitives into the building frame
///
/// `verts` is the current animation pose; `tex` the handles of the model's
/// texture slot. A model with any cutout face first gets one mask-mode packet
/// in the farthest bucket so it runs before the model's geometry.
pub fn render_model(ctx: &mut RenderCtx, model: &ModelData, verts: &[SVec3], tex: TextureRef) -> FrameStats {
    let mut stats = FrameStats::default();
    let ot_len = ctx.frame.ot.len();
    if ot_len == 0 {
        return stats;
    }

    if model.needs_cutout() {
        if !ctx.emit(Primitive::Mask(MaskMode::FromSource), ot_len - 1, &mut stats) {
            return stats;
        }
        stats.state_packets += 1;
    }

    let tri_count = model.tri_count();
    for (i, (vi, ui)) in model.tri_faces.iter().zip(&model.tri_uvs).enumerate() {
        if !render_face(ctx, model, verts, tex, i, vi, ui, &mut stats) {
            return stats;
        }
    }
    for (i, (vi, ui)) in model.quad_faces.iter().zip(&model.quad_uvs).enumerate() {
        if !render_face(ctx, model, verts, tex, tri_count + i, vi, ui, &mut stats) {
            return stats;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::PolyKind;
    use crate::gte::{DepthScale, ScreenXY};

    const OT_LEN: usize = 4096;

    fn gte() -> Gte {
        Gte::new(ScreenXY::new(160, 120), 160, DepthScale::for_table(OT_LEN))
    }

    /// Front-facing triangle whose depth key is 100
    fn tri_verts() -> Vec<SVec3> {
        vec![SVec3::new(0, 0, 200), SVec3::new(100, 0, 200), SVec3::new(0, 100, 201)]
    }

    fn tri_model(flags: MaterialFlags) -> ModelData {
        ModelData {
            tri_faces: vec![[0, 1, 2]],
            tri_uvs: vec![[0, 1, 2]],
            uvs: vec![Uv::new(0, 0), Uv::new(64, 0), Uv::new(0, 64)],
            normals: vec![SVec3::new(0, 0, -4096); 3],
            vertex_colors: Some(vec![Rgb::new(10, 20, 30), Rgb::new(40, 50, 60), Rgb::new(70, 80, 90)]),
            material_flags: vec![flags],
            ..Default::default()
        }
    }

    fn run(model: &ModelData, verts: &[SVec3], lighting: &Lighting, frame: &mut FrameSlot) -> FrameStats {
        let gte = gte();
        let mut ctx = RenderCtx { gte: &gte, lighting, frame };
        render_model(&mut ctx, model, verts, TextureRef::new(0x0085, 0x7A40))
    }

    fn prims(frame: &FrameSlot) -> Vec<(usize, Primitive)> {
        frame.ot.iter(&frame.arena).map(|(k, p)| (k, *p)).collect()
    }

    #[test]
    fn test_single_unlit_textured_flat_triangle() {
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        let model = tri_model(MaterialFlags::UNLIT | MaterialFlags::TEXTURED);
        let stats = run(&model, &tri_verts(), &Lighting::default(), &mut frame);

        assert_eq!(stats.emitted, 1);
        assert_eq!(frame.arena.len(), 1);
        assert_eq!(frame.ot.bucket_len(100, &frame.arena), 1);
        let (key, prim) = prims(&frame)[0];
        assert_eq!(key, 100);
        assert_eq!(prim.kind(), Some(PolyKind::Ft3));
        assert_eq!(frame.arena.used(), PolyKind::Ft3.size_bytes());
        assert_eq!(prim.texture(), Some(TextureRef::new(0x0085, 0x7A40)));
        // Vertex colour flag not set: flat gray
        assert_eq!(prim.vertices()[0].1, Rgb::GRAY);
        assert_eq!(prim.vertices()[1].2, Some(Uv::new(64, 0)));
    }

    #[test]
    fn test_back_face_allocates_nothing() {
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        let mut model = tri_model(MaterialFlags::TEXTURED);
        model.tri_faces = vec![[0, 2, 1]];
        let stats = run(&model, &tri_verts(), &Lighting::default(), &mut frame);

        assert_eq!(stats.culled_back, 1);
        assert_eq!(stats.emitted, 0);
        assert_eq!(frame.arena.used(), 0);
        assert_eq!(frame.ot.count(&frame.arena), 0);
    }

    #[test]
    fn test_out_of_range_depth_allocates_nothing() {
        let mut frame = FrameSlot::new(64, 4096, Rgb::BLACK);
        let model = tri_model(MaterialFlags::empty());
        let stats = run(&model, &tri_verts(), &Lighting::default(), &mut frame);

        assert_eq!(stats.culled_depth, 1);
        assert_eq!(frame.arena.used(), 0);
        assert_eq!(frame.ot.count(&frame.arena), 0);
    }

    #[test]
    fn test_face_behind_camera_allocates_nothing() {
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        let model = tri_model(MaterialFlags::TEXTURED);
        let behind: Vec<SVec3> = tri_verts().iter().map(|v| SVec3::new(v.x, v.y, -v.z)).collect();
        let stats = run(&model, &behind, &Lighting::default(), &mut frame);

        assert_eq!(stats.culled_depth, 1);
        assert_eq!(stats.emitted, 0);
        assert_eq!(frame.arena.used(), 0);
        assert_eq!(frame.ot.bucket_len(0, &frame.arena), 0);
    }

    #[test]
    fn test_unlit_ignores_normals() {
        let flags = MaterialFlags::UNLIT | MaterialFlags::SMOOTH | MaterialFlags::VERTEX_COLOR;
        let mut model = tri_model(flags);
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        run(&model, &tri_verts(), &Lighting::default(), &mut frame);
        let clean = prims(&frame)[0].1;

        model.normals = vec![SVec3::new(i16::MIN, 12345, -7); 3];
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        run(&model, &tri_verts(), &Lighting::default(), &mut frame);
        let garbage = prims(&frame)[0].1;

        assert_eq!(clean, garbage);
        let colors: Vec<Rgb> = clean.vertices().iter().map(|v| v.1).collect();
        assert_eq!(colors, model.vertex_colors.clone().unwrap());
    }

    #[test]
    fn test_flat_lit_uses_first_vertex() {
        let mut model = tri_model(MaterialFlags::VERTEX_COLOR);
        model.normals[1] = SVec3::new(0, 4096, 0);
        model.normals[2] = SVec3::new(4096, 0, 0);
        let light = Lighting::default();
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        run(&model, &tri_verts(), &light, &mut frame);

        let prim = prims(&frame)[0].1;
        assert_eq!(prim.kind(), Some(PolyKind::F3));
        let expected = light.light_vertex(model.normals[0], Rgb::new(10, 20, 30));
        assert_eq!(prim.vertices()[0].1, expected);
    }

    #[test]
    fn test_null_specular_matches_no_specular() {
        let light = Lighting::default();
        let lit = MaterialFlags::SMOOTH | MaterialFlags::VERTEX_COLOR;
        let mut model = tri_model(lit);
        model.normals = vec![SVec3::new(0, -4096, 0); 3];

        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        run(&model, &tri_verts(), &light, &mut frame);
        let plain = prims(&frame)[0].1;

        model.material_flags = vec![lit | MaterialFlags::SPECULAR | MaterialFlags::METALLIC];
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        run(&model, &tri_verts(), &light, &mut frame);
        assert_eq!(prims(&frame)[0].1, plain);

        // With data present the same flags do change the colour
        model.specular = Some(vec![200]);
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        run(&model, &tri_verts(), &light, &mut frame);
        assert_ne!(prims(&frame)[0].1, plain);
    }

    #[test]
    fn test_metallic_quad_darkens() {
        let normal = SVec3::new(0, 0, -4096);
        // ambient 0 and a light along the normal make lighting an identity
        let light = Lighting {
            ambient: Rgb::BLACK,
            direction: normal,
            color: SVec3::new(4096, 4096, 4096),
        };
        let model = ModelData {
            quad_faces: vec![[0, 1, 2, 3]],
            quad_uvs: vec![[0, 0, 0, 0]],
            uvs: vec![Uv::default()],
            normals: vec![normal; 4],
            vertex_colors: Some(vec![Rgb::new(50, 60, 70); 4]),
            material_flags: vec![MaterialFlags::SMOOTH | MaterialFlags::VERTEX_COLOR | MaterialFlags::METALLIC],
            metallic: Some(vec![200]),
            ..Default::default()
        };
        let verts = [
            SVec3::new(-100, -100, 400),
            SVec3::new(100, -100, 400),
            SVec3::new(-100, 100, 400),
            SVec3::new(100, 100, 400),
        ];
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        let stats = run(&model, &verts, &light, &mut frame);

        assert_eq!(stats.emitted, 1);
        let (key, prim) = prims(&frame)[0];
        // 512 * 1600 >> 12
        assert_eq!(key, 200);
        assert_eq!(prim.kind(), Some(PolyKind::G4));
        for (_, rgb, _) in prim.vertices() {
            assert_eq!(rgb, Rgb::new(4, 14, 24));
        }
    }

    #[test]
    fn test_one_cutout_face_one_mask_packet() {
        let mut model = tri_model(MaterialFlags::TEXTURED);
        model.tri_faces = vec![[0, 1, 2]; 501];
        model.tri_uvs = vec![[0, 1, 2]; 501];
        model.material_flags = vec![MaterialFlags::TEXTURED; 501];
        model.material_flags[250] |= MaterialFlags::CUTOUT;

        let mut frame = FrameSlot::new(OT_LEN, 1 << 16, Rgb::BLACK);
        let stats = run(&model, &tri_verts(), &Lighting::default(), &mut frame);

        assert_eq!(stats.state_packets, 1);
        assert_eq!(stats.emitted, 501);
        assert_eq!(frame.ot.bucket_len(OT_LEN - 1, &frame.arena), 1);
        let all = prims(&frame);
        assert_eq!(all[0], (OT_LEN - 1, Primitive::Mask(MaskMode::FromSource)));
        let masks = all.iter().filter(|(_, p)| matches!(p, Primitive::Mask(_))).count();
        assert_eq!(masks, 1);
    }

    #[test]
    fn test_arena_overflow_truncates() {
        let mut model = tri_model(MaterialFlags::empty());
        model.tri_faces = vec![[0, 1, 2]; 5];
        model.tri_uvs = vec![[0, 1, 2]; 5];
        model.material_flags = vec![MaterialFlags::empty(); 5];

        // Room for two flat triangles
        let mut frame = FrameSlot::new(OT_LEN, 2 * PolyKind::F3.size_bytes() + 4, Rgb::BLACK);
        let stats = run(&model, &tri_verts(), &Lighting::default(), &mut frame);

        assert_eq!(stats.emitted, 2);
        assert_eq!(stats.dropped, 1);
        assert!(stats.truncated);
        assert_eq!(frame.ot.count(&frame.arena), 2);
    }

    #[test]
    fn test_hidden_mesh_skipped() {
        let mut model = tri_model(MaterialFlags::empty());
        model.mesh_ids = Some(vec![3]);
        model.set_mesh_visible(3, false);
        let mut frame = FrameSlot::new(OT_LEN, 4096, Rgb::BLACK);
        let stats = run(&model, &tri_verts(), &Lighting::default(), &mut frame);
        assert_eq!(stats.hidden, 1);
        assert_eq!(frame.arena.used(), 0);
    }
}
