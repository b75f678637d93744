//! Vertex animation: per-frame vertex tables and the playback cursor

use crate::gte::SVec3;
use serde::{Deserialize, Serialize};

/// One named animation; every frame holds a full vertex table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimTrack {
    pub name: String,
    pub frames: Vec<Vec<SVec3>>,
}

impl AnimTrack {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationSet {
    /// Static pose, also used when a lookup misses
    pub bind_pose: Vec<SVec3>,
    #[serde(default)]
    pub tracks: Vec<AnimTrack>,
}

impl AnimationSet {
    pub fn vertex_count(&self) -> usize {
        self.bind_pose.len()
    }

    pub fn track(&self, index: usize) -> Option<&AnimTrack> {
        self.tracks.get(index)
    }

    /// Frame count of a track, 0 when it does not exist
    pub fn frame_count(&self, track: usize) -> usize {
        self.track(track).map_or(0, AnimTrack::frame_count)
    }

    /// Vertex table for `(track, frame)`
    ///
    /// Falls back to the bind pose for a missing track or frame. Playback
    /// wraps frames, so this only guards against bad asset tables.
    pub fn vertices(&self, track: usize, frame: usize) -> &[SVec3] {
        self.track(track)
            .and_then(|t| t.frames.get(frame))
            .map_or(&self.bind_pose[..], |f| &f[..])
    }
}

/// Playback cursor over an `AnimationSet`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animator {
    pub track: usize,
    pub frame: usize,
    timer: u32,
    /// Calls to `advance_frame` per animation frame
    pub period: u32,
    pub playing: bool,
}

impl Animator {
    pub fn new(period: u32) -> Self {
        Self {
            track: 0,
            frame: 0,
            timer: 0,
            period: period.max(1),
            playing: true,
        }
    }

    /// Tick once per displayed frame
    pub fn advance_frame(&mut self, set: &AnimationSet) {
        if !self.playing {
            return;
        }
        self.timer += 1;
        if self.timer >= self.period {
            self.timer = 0;
            self.frame += 1;
            if self.frame >= set.frame_count(self.track) {
                self.frame = 0;
            }
        }
    }

    /// Switch tracks, restarting from frame 0
    pub fn set_track(&mut self, track: usize) {
        self.track = track;
        self.frame = 0;
        self.timer = 0;
    }

    /// Step to the next track, wrapping; returns the new track
    pub fn cycle_track(&mut self, set: &AnimationSet) -> usize {
        let count = set.tracks.len().max(1);
        self.set_track((self.track + 1) % count);
        self.track
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn toggle_playing(&mut self) {
        self.playing = !self.playing;
    }

    pub fn current_vertices<'a>(&self, set: &'a AnimationSet) -> &'a [SVec3] {
        set.vertices(self.track, self.frame)
    }
}
