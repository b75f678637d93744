//! Viewer configuration
//!
//! Stored as RON. Every field has a default, so a config file only needs to
//! name what it changes.

use crate::gte::{DepthScale, Rgb, ScreenXY};
use crate::render::Lighting;
use ron::extensions::Extensions;
use crate::scene::Camera;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Loudest CD volume the mixer accepts
pub const MAX_CD_VOLUME: u16 = 0x3FFF;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u16,
    pub height: u16,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self { width: 320, height: 240 }
    }
}

/// Projection tunables; unset values derive from the screen and table size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Projection plane distance
    pub h: Option<i32>,
    /// Triangle depth divisor (4.12 scale of the summed depths)
    pub zsf3: Option<i32>,
    /// Quad depth divisor
    pub zsf4: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub screen: ScreenConfig,
    /// Number of depth buckets per frame
    pub ot_length: usize,
    /// Primitive arena capacity per buffer slot
    pub arena_bytes: usize,
    pub projection: ProjectionConfig,
    /// Display frames per animation frame
    pub anim_period: u32,
    pub clear_color: Rgb,
    pub lighting: Lighting,
    /// Starting camera
    pub camera: Camera,
    /// CD audio track to loop, if any
    pub cd_track: Option<u8>,
    pub cd_volume: u16,
    /// RON model replacing the built-in character
    pub model_path: Option<PathBuf>,
    /// TIM or image file for the character's texture slot
    pub texture_path: Option<PathBuf>,
    /// Window size as a multiple of the screen size
    pub window_scale: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            screen: ScreenConfig::default(),
            ot_length: 4096,
            arena_bytes: 131072,
            projection: ProjectionConfig::default(),
            anim_period: 2,
            clear_color: Rgb::new(40, 60, 80),
            lighting: Lighting::default(),
            camera: Camera::default(),
            cd_track: None,
            cd_volume: MAX_CD_VOLUME,
            model_path: None,
            texture_path: None,
            window_scale: 3,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.screen.width == 0 || self.screen.height == 0 {
            return invalid("screen size must be non-zero");
        }
        if self.ot_length == 0 {
            return invalid("ot_length must be at least 1");
        }
        if self.arena_bytes == 0 {
            return invalid("arena_bytes must be non-zero");
        }
        if self.anim_period == 0 {
            return invalid("anim_period must be at least 1");
        }
        if self.projection.h.is_some_and(|h| h <= 0) {
            return invalid("projection.h must be positive");
        }
        if self.cd_volume > MAX_CD_VOLUME {
            return Err(ConfigError::Invalid(format!(
                "cd_volume {:#x} above maximum {:#x}",
                self.cd_volume, MAX_CD_VOLUME
            )));
        }
        Ok(())
    }

    /// Screen centre, the projection offset
    pub fn screen_center(&self) -> ScreenXY {
        ScreenXY::new((self.screen.width / 2) as i16, (self.screen.height / 2) as i16)
    }

    pub fn projection_h(&self) -> i32 {
        self.projection.h.unwrap_or(self.screen.width as i32 / 2)
    }

    pub fn depth_scale(&self) -> DepthScale {
        let defaults = DepthScale::for_table(self.ot_length);
        DepthScale {
            zsf3: self.projection.zsf3.unwrap_or(defaults.zsf3),
            zsf4: self.projection.zsf4.unwrap_or(defaults.zsf4),
        }
    }
}

/// Load and validate a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig, ConfigError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config = load_config_from_str(&contents)?;
    info!(path = %path.as_ref().display(), "loaded config");
    Ok(config)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &ViewerConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a config from a RON string
///
/// Optional fields may be written bare (`zsf4: 100`) or as `Some(100)`.
pub fn load_config_from_str(s: &str) -> Result<ViewerConfig, ConfigError> {
    let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    let config: ViewerConfig = options.from_str(s)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = load_config_from_str("()").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.screen_center(), ScreenXY::new(160, 120));
        assert_eq!(config.projection_h(), 160);
        assert_eq!(config.depth_scale(), DepthScale { zsf3: 682, zsf4: 512 });
    }

    #[test]
    fn test_partial_override() {
        let config = load_config_from_str("(ot_length: 1024, projection: (zsf4: 100), cd_track: Some(2))").unwrap();
        assert_eq!(config.ot_length, 1024);
        assert_eq!(config.depth_scale(), DepthScale { zsf3: 170, zsf4: 100 });
        assert_eq!(config.cd_track, Some(2));
        assert_eq!(config.anim_period, 2);

        let config = load_config_from_str("(projection: (h: Some(200), zsf3: 300), cd_track: 3)").unwrap();
        assert_eq!(config.projection_h(), 200);
        assert_eq!(config.depth_scale(), DepthScale { zsf3: 300, zsf4: 512 });
        assert_eq!(config.cd_track, Some(3));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in ["(ot_length: 0)", "(arena_bytes: 0)", "(anim_period: 0)", "(cd_volume: 65535)"] {
            assert!(
                matches!(load_config_from_str(text), Err(ConfigError::Invalid(_))),
                "{text} accepted"
            );
        }
        assert!(matches!(load_config_from_str("(ot_length: "), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = ViewerConfig::default();
        config.clear_color = Rgb::new(1, 2, 3);
        config.model_path = Some(PathBuf::from("assets/hero.ron"));
        let path = std::env::temp_dir().join(format!("psx-viewer-config-{}.ron", std::process::id()));
        save_config(&config, &path).unwrap();
        let back = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(back, config);
    }
}
