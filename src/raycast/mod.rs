//! Anti-aliased ray-casting software renderer
//!
//! Pipeline per output image:
//! - project camera space meshes and bin their triangles into a 2D grid
//! - adaptively sample the image; every sample casts a ray that collects the
//!   nearest intersections, shades them and composites back to front
//!
//! All colors are alpha-premultiplied floats in unit range.

mod best_n;
mod caster;
mod composite;
mod grid;
mod math;
mod projection;
mod sampler;
mod shader;
mod types;

pub use best_n::*;
pub use caster::*;
pub use composite::*;
pub use grid::*;
pub use math::*;
pub use projection::*;
pub use sampler::*;
pub use shader::*;
pub use types::*;

use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

/// Largest RGB value a lit surface is expected to reach
pub const CHANNEL_BOUND: f32 = 1.0;

/// Render settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// In [1,16], higher resolves finer detail and is slower
    pub anti_alias_bit_depth: u32,
    /// Grid cells per projected vertex for the spatial index
    pub bins_per_tri: f32,
    /// Sample image rows in parallel
    pub parallel: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            anti_alias_bit_depth: 3,
            bins_per_tri: 1.0,
            parallel: true,
        }
    }
}

/// Render `meshes` (vertices already in camera space) to a premultiplied image.
/// `background` must be premultiplied with channels in [0,1].
pub fn soft_render(
    width: usize,
    height: usize,
    meshes: &[Mesh],
    lighting: &Lighting,
    projection: &Projection,
    background: Rgba,
    options: &RenderOptions,
) -> SampledImage {
    assert!(
        background.min_channel() >= 0.0 && background.max_channel() <= 1.0,
        "background channels must be in [0,1]: {:?}",
        background
    );

    let start = Instant::now();
    let shader = Shader::new(lighting.clone(), DEFAULT_ALBEDO);
    let caster = RayCaster::new(meshes, projection, shader, background, options.bins_per_tri);
    let sampler = Sampler::new(options.anti_alias_bit_depth, CHANNEL_BOUND).with_parallel(options.parallel);

    let image = sampler.sample(width, height, &|pos| caster.cast(pos));

    info!(
        "rendered {}x{} from {} meshes ({} tris) in {:.2?} ({} rays)",
        width,
        height,
        meshes.len(),
        meshes.iter().map(Mesh::num_tris).sum::<usize>(),
        start.elapsed(),
        image.stats.samples
    );
    image
}
