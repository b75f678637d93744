//! PSX Viewer: PS1-style painter's-algorithm renderer
//!
//! An animated model drawn the way the PlayStation does it:
//! - Fixed-point transform, facing test and depth keys (`gte`)
//! - Depth-bucketed ordering tables over a per-frame primitive arena (`gpu`)
//! - Material flags choosing the primitive variant and its shading (`render`)
//! - A double-buffered frame driver with a free camera (`scene`)

pub mod audio;
pub mod config;
pub mod gpu;
pub mod gte;
pub mod model;
pub mod render;
pub mod scene;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
