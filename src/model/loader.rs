//! Model asset files (RON)
//!
//! A model asset bundles the face tables with the animation set that feeds
//! them. Everything is validated once at load time so the per-face loop can
//! index without checks.

use super::animation::AnimationSet;
use super::data::ModelData;
use crate::gpu::TimError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Texture error: {0}")]
    Tim(#[from] TimError),
    #[error("Invalid model: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelAsset {
    pub name: String,
    pub model: ModelData,
    pub animation: AnimationSet,
}

impl ModelAsset {
    /// Check faces against the bind pose and every animation frame
    pub fn validate(&self) -> Result<(), AssetError> {
        let count = self.animation.vertex_count();
        self.model.validate(count)?;
        for track in &self.animation.tracks {
            if let Some((i, frame)) = track.frames.iter().enumerate().find(|(_, f)| f.len() != count) {
                return Err(AssetError::Invalid(format!(
                    "track '{}' frame {} has {} vertices, bind pose has {}",
                    track.name,
                    i,
                    frame.len(),
                    count
                )));
            }
        }
        Ok(())
    }
}

/// Load and validate a model from a RON file
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelAsset, AssetError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let asset = load_model_from_str(&contents)?;
    info!(
        path = %path.as_ref().display(),
        name = %asset.name,
        faces = asset.model.face_count(),
        tracks = asset.animation.tracks.len(),
        "loaded model"
    );
    Ok(asset)
}

/// Save a model to a RON file
pub fn save_model<P: AsRef<Path>>(asset: &ModelAsset, path: P) -> Result<(), AssetError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(asset, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a model from a RON string (for embedded assets or testing)
pub fn load_model_from_str(s: &str) -> Result<ModelAsset, AssetError> {
    let asset: ModelAsset = ron::from_str(s)?;
    asset.validate()?;
    Ok(asset)
}
