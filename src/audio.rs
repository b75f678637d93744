//! CD audio track control
//!
//! The drive and mixer are external; this only tracks what was asked of
//! them. Track 1 of a PS1 disc is the data track, so audio starts at 2.

use crate::config::MAX_CD_VOLUME;
use thiserror::Error;
use tracing::{debug, info};

pub const FIRST_AUDIO_TRACK: u8 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("track {0} is not an audio track")]
    NotAudio(u8),
}

/// Hardware side of CD playback
pub trait CdDrive {
    /// Start looping `track`
    fn play(&mut self, track: u8);
    fn stop(&mut self);
    /// Left and right CD mix volume
    fn set_volume(&mut self, left: u16, right: u16);
}

/// Drive that only logs; used when there is no disc to play
#[derive(Debug, Default)]
pub struct LoggingDrive;

impl CdDrive for LoggingDrive {
    fn play(&mut self, track: u8) {
        info!(track, "cd play");
    }

    fn stop(&mut self) {
        info!("cd stop");
    }

    fn set_volume(&mut self, left: u16, right: u16) {
        debug!(left, right, "cd volume");
    }
}

pub struct CdAudio<D: CdDrive> {
    drive: D,
    track: Option<u8>,
    volume: u16,
}

impl<D: CdDrive> CdAudio<D> {
    /// Wrap a drive and push the initial volume to it
    pub fn new(mut drive: D, volume: u16) -> Self {
        let volume = volume.min(MAX_CD_VOLUME);
        drive.set_volume(volume, volume);
        Self { drive, track: None, volume }
    }

    /// Loop `track`; asking for the track already playing does nothing
    pub fn play_track(&mut self, track: u8) -> Result<(), AudioError> {
        if track < FIRST_AUDIO_TRACK {
            return Err(AudioError::NotAudio(track));
        }
        if self.track == Some(track) {
            return Ok(());
        }
        self.drive.play(track);
        self.track = Some(track);
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.track.take().is_some() {
            self.drive.stop();
        }
    }

    /// Set both channels, clamped to the mixer's range
    pub fn set_volume(&mut self, volume: u16) {
        self.volume = volume.min(MAX_CD_VOLUME);
        self.drive.set_volume(self.volume, self.volume);
    }

    pub fn track(&self) -> Option<u8> {
        self.track
    }

    pub fn volume(&self) -> u16 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.track.is_some()
    }
}
