//! Static model tables
//!
//! Triangles and quads are stored separately but share one flattened
//! per-face table for material flags, specular and metallic bytes and mesh
//! ids: triangle `i` is entry `i`, quad `i` is entry `tri_faces.len() + i`.

use super::loader::AssetError;
use crate::gpu::Uv;
use crate::gte::{Rgb, SVec3};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-face material switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MaterialFlags: u8 {
        const UNLIT = 1 << 0;
        const TEXTURED = 1 << 1;
        const SMOOTH = 1 << 2;
        const VERTEX_COLOR = 1 << 3;
        const ALPHA = 1 << 4;
        const CUTOUT = 1 << 5;
        const SPECULAR = 1 << 6;
        const METALLIC = 1 << 7;
    }
}

fn all_meshes() -> u32 {
    u32::MAX
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelData {
    pub tri_faces: Vec<[u16; 3]>,
    pub tri_uvs: Vec<[u16; 3]>,
    pub quad_faces: Vec<[u16; 4]>,
    pub quad_uvs: Vec<[u16; 4]>,
    /// Shared UV table
    pub uvs: Vec<Uv>,
    /// One per vertex; only read for lit faces
    pub normals: Vec<SVec3>,
    #[serde(default)]
    pub vertex_colors: Option<Vec<Rgb>>,
    pub material_flags: Vec<MaterialFlags>,
    /// Per-face specular strength; `None` disables specular even when flagged
    #[serde(default)]
    pub specular: Option<Vec<u8>>,
    #[serde(default)]
    pub metallic: Option<Vec<u8>>,
    /// Per-face mesh number, tested against `visible_meshes`
    #[serde(default)]
    pub mesh_ids: Option<Vec<u8>>,
    /// Bit N set: mesh N is drawn
    #[serde(default = "all_meshes")]
    pub visible_meshes: u32,
}

impl Default for ModelData {
    fn default() -> Self {
        Self {
            tri_faces: Vec::new(),
            tri_uvs: Vec::new(),
            quad_faces: Vec::new(),
            quad_uvs: Vec::new(),
            uvs: Vec::new(),
            normals: Vec::new(),
            vertex_colors: None,
            material_flags: Vec::new(),
            specular: None,
            metallic: None,
            mesh_ids: None,
            visible_meshes: all_meshes(),
        }
    }
}

impl ModelData {
    pub fn tri_count(&self) -> usize {
        self.tri_faces.len()
    }

    pub fn quad_count(&self) -> usize {
        self.quad_faces.len()
    }

    pub fn face_count(&self) -> usize {
        self.tri_count() + self.quad_count()
    }

    /// Flags of flattened face `face`
    pub fn flags(&self, face: usize) -> MaterialFlags {
        self.material_flags.get(face).copied().unwrap_or_default()
    }

    /// True when any face asks for cutout transparency
    pub fn needs_cutout(&self) -> bool {
        self.material_flags.iter().any(|f| f.contains(MaterialFlags::CUTOUT))
    }

    pub fn mesh_visible(&self, face: usize) -> bool {
        match &self.mesh_ids {
            Some(ids) => {
                let id = ids.get(face).copied().unwrap_or(0) as u32;
                id < 32 && self.visible_meshes & (1 << id) != 0
            }
            None => true,
        }
    }

    pub fn set_mesh_visible(&mut self, mesh: u32, visible: bool) {
        if mesh >= 32 {
            return;
        }
        if visible {
            self.visible_meshes |= 1 << mesh;
        } else {
            self.visible_meshes &= !(1 << mesh);
        }
    }

    /// Check every index and table length against `vertex_count` vertices
    pub fn validate(&self, vertex_count: usize) -> Result<(), AssetError> {
        let faces = self.face_count();
        let per_face = |table: &'static str, len: Option<usize>| match len {
            Some(len) if len != faces => Err(AssetError::Invalid(format!(
                "{table} has {len} entries, expected one per face ({faces})"
            ))),
            _ => Ok(()),
        };
        per_face("material_flags", Some(self.material_flags.len()))?;
        per_face("specular", self.specular.as_ref().map(Vec::len))?;
        per_face("metallic", self.metallic.as_ref().map(Vec::len))?;
        per_face("mesh_ids", self.mesh_ids.as_ref().map(Vec::len))?;

        if self.tri_uvs.len() != self.tri_count() || self.quad_uvs.len() != self.quad_count() {
            return Err(AssetError::Invalid("UV index tables do not match face tables".to_string()));
        }
        if self.normals.len() != vertex_count {
            return Err(AssetError::Invalid(format!(
                "{} normals for {} vertices",
                self.normals.len(),
                vertex_count
            )));
        }
        if let Some(colors) = &self.vertex_colors {
            if colors.len() != vertex_count {
                return Err(AssetError::Invalid(format!(
                    "{} vertex colours for {} vertices",
                    colors.len(),
                    vertex_count
                )));
            }
        }

        let mut verts = self.tri_faces.iter().flatten().chain(self.quad_faces.iter().flatten());
        if let Some(&bad) = verts.find(|&&v| v as usize >= vertex_count) {
            return Err(AssetError::Invalid(format!("vertex index {bad} out of range ({vertex_count})")));
        }
        let mut uvs = self.tri_uvs.iter().flatten().chain(self.quad_uvs.iter().flatten());
        if let Some(&bad) = uvs.find(|&&i| i as usize >= self.uvs.len()) {
            return Err(AssetError::Invalid(format!(
                "UV index {bad} out of range ({})",
                self.uvs.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_model() -> ModelData {
        ModelData {
            tri_faces: vec![[0, 1, 2]],
            tri_uvs: vec![[0, 1, 2]],
            quad_faces: vec![[0, 1, 2, 3]],
            quad_uvs: vec![[0, 1, 2, 3]],
            uvs: vec![Uv::new(0, 0), Uv::new(63, 0), Uv::new(0, 63), Uv::new(63, 63)],
            normals: vec![SVec3::new(0, -4096, 0); 4],
            material_flags: vec![MaterialFlags::TEXTURED, MaterialFlags::CUTOUT],
            mesh_ids: Some(vec![0, 1]),
            ..Default::default()
        }
    }

    #[test]
    fn test_quad_flags_follow_triangles() {
        let m = quad_model();
        assert_eq!(m.flags(0), MaterialFlags::TEXTURED);
        assert_eq!(m.flags(m.tri_count()), MaterialFlags::CUTOUT);
        assert!(m.needs_cutout());
        assert!(m.validate(4).is_ok());
    }

    #[test]
    fn test_mesh_visibility_mask() {
        let mut m = quad_model();
        m.set_mesh_visible(1, false);
        assert!(m.mesh_visible(0));
        assert!(!m.mesh_visible(1));
        m.mesh_ids = None;
        assert!(m.mesh_visible(1));
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let mut m = quad_model();
        m.quad_faces[0][3] = 9;
        assert!(matches!(m.validate(4), Err(AssetError::Invalid(_))));

        let mut m = quad_model();
        m.tri_uvs[0][2] = 4;
        assert!(m.validate(4).is_err());

        let mut m = quad_model();
        m.specular = Some(vec![10]);
        assert!(m.validate(4).is_err());

        assert!(quad_model().validate(5).is_err());
    }

    #[test]
    fn test_flags_ron_round_trip() {
        let flags = MaterialFlags::TEXTURED | MaterialFlags::SMOOTH;
        let text = ron::to_string(&flags).unwrap();
        let back: MaterialFlags = ron::from_str(&text).unwrap();
        assert_eq!(back, flags);
    }
}
