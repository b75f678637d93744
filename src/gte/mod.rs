//! Software geometry transformation engine
//!
//! Fixed-point replacement for the PS1's GTE coprocessor:
//! - 4.12 scalars, short/long vectors, integer sine and cosine
//! - Rotation matrices with translation, composition and scaling
//! - Perspective transform, facing test and ordering-table depth keys

mod fixed;
mod matrix;
mod project;

pub use fixed::*;
pub use matrix::*;
pub use project::*;
