//! Model data: face tables, material flags, vertex animation and assets

mod animation;
mod data;
mod loader;
pub mod props;

pub use animation::*;
pub use data::*;
pub use loader::*;
