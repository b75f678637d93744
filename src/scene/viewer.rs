//! Frame driver: input, animation, build, swap, present

use super::camera::Camera;
use super::input::{Buttons, Pad};
use super::Scene;
use crate::config::ViewerConfig;
use crate::gpu::{DisplaySink, DoubleBuffer};
use crate::gte::{Gte, Rgb};
use crate::render::{render_model, FrameStats, RenderCtx};
use tracing::{info, warn};

pub struct Viewer {
    pub config: ViewerConfig,
    pub scene: Scene,
    pub camera: Camera,
    pub pad: Pad,
    buffers: DoubleBuffer,
    gte: Gte,
    /// Counters of the last completed frame
    pub stats: FrameStats,
    frames: u64,
}

/// What the text overlay shows about the focused object's animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimStatus {
    pub track: String,
    pub frame: usize,
    pub frame_count: usize,
    pub playing: bool,
}

impl Viewer {
    pub fn new(config: ViewerConfig, scene: Scene) -> Self {
        let buffers = DoubleBuffer::new(config.ot_length, config.arena_bytes, config.clear_color);
        let gte = Gte::new(config.screen_center(), config.projection_h(), config.depth_scale());
        Self {
            camera: config.camera,
            config,
            scene,
            pad: Pad::new(),
            buffers,
            gte,
            stats: FrameStats::default(),
            frames: 0,
        }
    }

    /// Run one whole frame and hand the finished table to `sink`
    pub fn frame(&mut self, buttons: Buttons, sink: &mut impl DisplaySink) -> FrameStats {
        self.pad.update(buttons);
        self.handle_input();
        self.scene.update();

        self.stats = self.build();
        self.buffers.swap();
        sink.present(self.buffers.presenting());

        self.frames += 1;
        self.stats
    }

    fn handle_input(&mut self) {
        self.camera.apply_input(&self.pad);

        let triangle = self.pad.pressed(Buttons::TRIANGLE);
        let start = self.pad.pressed(Buttons::START);
        let Some(obj) = self.scene.focused_mut() else {
            return;
        };
        let Some(anim) = &mut obj.animator else {
            return;
        };
        if triangle {
            let track = anim.cycle_track(&obj.asset.animation);
            let name = obj.asset.animation.track(track).map_or("", |t| t.name.as_str());
            info!(track, name, "switched animation");
        }
        if start {
            anim.toggle_playing();
            info!(playing = anim.playing, "animation playback");
        }
    }

    /// Fill the building slot with every object's primitives
    fn build(&mut self) -> FrameStats {
        let view = self.camera.view_matrix();
        let frame = self.buffers.building_mut();
        let mut stats = FrameStats::default();

        for obj in &self.scene.objects {
            self.gte.set_matrix(view.compose(&obj.transform.matrix()));
            let lighting = self.config.lighting.to_local(&obj.transform.rotation_matrix());
            let mut ctx = RenderCtx {
                gte: &self.gte,
                lighting: &lighting,
                frame: &mut *frame,
            };
            stats += render_model(&mut ctx, &obj.asset.model, obj.vertices(), obj.texture);
            if stats.truncated {
                warn!(
                    frame = self.frames,
                    model = %obj.asset.name,
                    used = frame.arena.used(),
                    capacity = frame.arena.capacity(),
                    "primitive arena full, frame truncated"
                );
                break;
            }
        }
        stats
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn anim_status(&self) -> Option<AnimStatus> {
        let obj = self.scene.focused()?;
        let anim = obj.animator.as_ref()?;
        let set = &obj.asset.animation;
        Some(AnimStatus {
            track: set.track(anim.track).map(|t| t.name.clone()).unwrap_or_default(),
            frame: anim.frame,
            frame_count: set.frame_count(anim.track),
            playing: anim.playing,
        })
    }

    pub fn set_clear_color(&mut self, color: Rgb) {
        self.config.clear_color = color;
        self.buffers.set_clear_color(color);
    }
}
