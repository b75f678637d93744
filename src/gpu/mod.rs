//! Draw-side state: primitives, ordering tables, frame buffers and VRAM
//!
//! The geometry stage fills the building `FrameSlot`; a `DisplaySink` drains
//! the presenting one.

mod arena;
mod frame;
mod ordering_table;
mod primitive;
mod raster;
mod tim;
mod vram;

pub use arena::*;
pub use frame::*;
pub use ordering_table::*;
pub use primitive::*;
pub use raster::*;
pub use tim::*;
pub use vram::*;
