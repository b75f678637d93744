//! Scene composition and the per-frame driver
//!
//! The scene is fixed: an animated character standing on a ground plane,
//! with a moon, a coin and a star around it. Each object carries its own
//! transform and texture slot.

mod camera;
mod input;
mod viewer;

pub use camera::*;
pub use input::*;
pub use viewer::*;

use crate::config::ViewerConfig;
use crate::gpu::{SlotTable, TextureRef, TimImage, Vram};
use crate::gte::{Matrix, SVec3, Vec3i, ONE};
use crate::model::{load_model, props, Animator, AssetError, ModelAsset};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Placement of one object in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3i,
    pub rotation: SVec3,
    /// Per-axis scale, 4.12
    pub scale: Vec3i,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3i::ZERO,
            rotation: SVec3::ZERO,
            scale: Vec3i::new(ONE, ONE, ONE),
        }
    }
}

impl Transform {
    pub fn at(position: Vec3i) -> Self {
        Self { position, ..Default::default() }
    }

    /// Model-to-world: scale, rotate, translate
    pub fn matrix(&self) -> Matrix {
        self.rotation_matrix().scale(&self.scale).with_translation(self.position)
    }

    pub fn rotation_matrix(&self) -> Matrix {
        Matrix::rotation(&self.rotation)
    }
}

pub struct SceneObject {
    pub asset: ModelAsset,
    pub transform: Transform,
    /// Rotation added every frame
    pub spin: SVec3,
    pub texture: TextureRef,
    pub animator: Option<Animator>,
}

impl SceneObject {
    pub fn new(asset: ModelAsset, transform: Transform) -> Self {
        Self {
            asset,
            transform,
            spin: SVec3::ZERO,
            texture: TextureRef::NONE,
            animator: None,
        }
    }

    pub fn with_spin(mut self, spin: SVec3) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_animator(mut self, animator: Animator) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Current pose: the animation frame, or the bind pose for static props
    pub fn vertices(&self) -> &[SVec3] {
        match &self.animator {
            Some(anim) => anim.current_vertices(&self.asset.animation),
            None => &self.asset.animation.bind_pose,
        }
    }

    /// Advance animation and spin by one display frame
    pub fn update(&mut self) {
        if let Some(anim) = &mut self.animator {
            anim.advance_frame(&self.asset.animation);
        }
        let r = &mut self.transform.rotation;
        r.x = r.x.wrapping_add(self.spin.x);
        r.y = r.y.wrapping_add(self.spin.y);
        r.z = r.z.wrapping_add(self.spin.z);
    }
}

pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub slots: SlotTable,
    /// Object the pad's animation controls act on
    pub focus: usize,
}

pub const CHARACTER_SLOT: usize = 0;
pub const MOON_SLOT: usize = 1;
pub const COIN_SLOT: usize = 2;
pub const STAR_SLOT: usize = 3;

impl Scene {
    /// Built-in props with their textures bound into `vram`
    pub fn demo(anim_period: u32, vram: &mut Vram) -> Result<Self, AssetError> {
        let mut scene = Scene {
            objects: Vec::new(),
            slots: SlotTable::with_default_layout(),
            focus: 0,
        };

        scene.objects.push(
            SceneObject::new(props::character(), Transform::default()).with_animator(Animator::new(anim_period)),
        );
        scene.objects.push(SceneObject::new(props::ground(), Transform::default()));
        scene.objects.push(SceneObject::new(props::moon(), Transform::at(Vec3i::new(900, -1800, 1600))).with_spin(SVec3::new(0, 8, 0)));
        scene.objects.push(SceneObject::new(props::coin(), Transform::at(Vec3i::new(-600, -500, 0))).with_spin(SVec3::new(0, 32, 0)));
        scene.objects.push(SceneObject::new(props::star(), Transform::at(Vec3i::new(600, -600, 0))).with_spin(SVec3::new(0, 24, 0)));

        scene.bind_texture(0, CHARACTER_SLOT, "builtin:character", &props::character_texture()?, vram);
        scene.bind_texture(2, MOON_SLOT, "builtin:moon", &props::moon_texture()?, vram);
        scene.bind_texture(3, COIN_SLOT, "builtin:coin", &props::coin_texture()?, vram);
        scene.bind_texture(4, STAR_SLOT, "builtin:star", &props::star_texture()?, vram);
        Ok(scene)
    }

    /// Demo scene with the character swapped for the configured model and
    /// texture, when set
    pub fn from_config(config: &ViewerConfig, vram: &mut Vram) -> Result<Self, AssetError> {
        let mut scene = Self::demo(config.anim_period, vram)?;
        if let Some(path) = &config.model_path {
            let asset = load_model(path)?;
            if let Some(character) = scene.objects.get_mut(scene.focus) {
                character.asset = asset;
                character.animator = Some(Animator::new(config.anim_period));
            }
        }
        if let Some(path) = &config.texture_path {
            let image = TimImage::from_file(path)?;
            let source = path.display().to_string();
            scene.bind_texture(scene.focus, CHARACTER_SLOT, &source, &image, vram);
            info!(path = %source, width = image.width, height = image.height, "loaded texture");
        }
        Ok(scene)
    }

    /// Upload `image` into `slot` and point `object` at it
    pub fn bind_texture(&mut self, object: usize, slot: usize, source: &str, image: &TimImage, vram: &mut Vram) {
        let tex = self.slots.bind(slot, source, image, vram);
        if let Some(obj) = self.objects.get_mut(object) {
            obj.texture = tex;
        }
    }

    pub fn update(&mut self) {
        for obj in &mut self.objects {
            obj.update();
        }
    }

    pub fn focused(&self) -> Option<&SceneObject> {
        self.objects.get(self.focus)
    }

    pub fn focused_mut(&mut self) -> Option<&mut SceneObject> {
        self.objects.get_mut(self.focus)
    }
}
