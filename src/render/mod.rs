//! Material-driven primitive selection and shading

mod model;
mod shade;

pub use model::*;
pub use shade::*;
