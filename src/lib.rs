//! softcast: anti-aliased CPU ray casting of triangle meshes
//!
//! - `raycast`: projection, spatial index, shading, compositing and adaptive sampling
//! - `scene`: RON scene files and the built-in demo
//! - `export`: premultiplied float images to 8-bit PNG

pub mod error;
pub mod export;
pub mod raycast;
pub mod scene;

pub use error::{RenderError, RenderResult};
pub use raycast::{soft_render, Lighting, Mesh, Projection, RenderOptions, Rgba, SampledImage};
