//! Ray caster: nearest-first triangle intersections across meshes
//!
//! Each mesh gets its own spatial index over its projected vertices. A cast
//! gathers up to `MAX_LAYERS` hits from all meshes, shades them and composites
//! back to front over the background.

use log::{debug, warn};

use super::best_n::BestN;
use super::composite::composite;
use super::grid::{GridTriangles, IndexedTriangle, Intersection};
use super::math::Vec2;
use super::projection::Projection;
use super::shader::{Fragment, Shader};
use super::types::{Mesh, Rgba};

/// Depth layers kept per ray for transparency
pub const MAX_LAYERS: usize = 8;

/// One ray hit, tagged with the mesh it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub mesh: usize,
    pub isect: Intersection,
}

struct CastMesh<'a> {
    mesh: &'a Mesh,
    /// `None` when nothing of the mesh is in front of the camera
    grid: Option<GridTriangles>,
}

pub struct RayCaster<'a> {
    meshes: Vec<CastMesh<'a>>,
    shader: Shader,
    background: Rgba,
}

impl<'a> RayCaster<'a> {
    /// Project and index all meshes. `background` must be premultiplied.
    /// Panics if a mesh fails `Mesh::validate`.
    pub fn new(
        meshes: &'a [Mesh],
        projection: &Projection,
        shader: Shader,
        background: Rgba,
        bins_per_tri: f32,
    ) -> Self {
        let meshes = meshes
            .iter()
            .enumerate()
            .map(|(mesh_idx, mesh)| {
                if let Err(err) = mesh.validate() {
                    panic!("{}", err);
                }

                let projected = projection.project_all(&mesh.positions);
                let tris: Vec<IndexedTriangle> = mesh
                    .surfaces
                    .iter()
                    .enumerate()
                    .flat_map(|(surf_idx, surf)| {
                        surf.tris
                            .iter()
                            .enumerate()
                            .map(move |(tri_idx, &t)| IndexedTriangle::new(t, mesh_idx, surf_idx, tri_idx))
                    })
                    .collect();

                let grid = GridTriangles::try_new(projected, &tris, bins_per_tri);
                match &grid {
                    Some(g) => debug!("mesh '{}': {} tris, grid {:?}", mesh.name, tris.len(), g.dims()),
                    None => warn!("mesh '{}' has no visible extent and will not be drawn", mesh.name),
                }
                CastMesh { mesh, grid }
            })
            .collect();

        Self {
            meshes,
            shader,
            background,
        }
    }

    /// Nearest `MAX_LAYERS` hits across all meshes, nearest first
    pub fn closest_intersects(&self, pos: Vec2) -> BestN<MAX_LAYERS, Hit> {
        let mut best = BestN::new();
        for (mesh, cm) in self.meshes.iter().enumerate() {
            if let Some(grid) = &cm.grid {
                grid.for_each_intersect(pos, |isect| {
                    best.update(isect.inv_depth, Hit { mesh, isect });
                });
            }
        }
        best
    }

    /// Shade a single hit
    pub fn shade(&self, hit: &Hit) -> Rgba {
        let cm = &self.meshes[hit.mesh];
        let Some(grid) = &cm.grid else {
            return Rgba::TRANSPARENT;
        };
        let mesh = cm.mesh;
        let tri = hit.isect.triangle;
        let vi = tri.verts.map(|i| i as usize);

        let inv_depths = vi.map(|i| grid.vertices()[i].inv_depth);
        let weights = hit.isect.perspective_weights(inv_depths);

        let normals = vi.map(|i| mesh.normals[i]);
        let uvs = mesh.uvs.as_ref().map(|uvs| vi.map(|i| uvs[i]));
        let frag = Fragment::interpolate(normals, uvs, weights);

        let material = &mesh.surfaces[tri.surface as usize].material;
        self.shader.shade(&frag, material)
    }

    /// Final premultiplied color along the ray through `pos` (IUCS)
    pub fn cast(&self, pos: Vec2) -> Rgba {
        let best = self.closest_intersects(pos);
        if best.is_empty() {
            return self.background;
        }
        let mut frags = [Rgba::TRANSPARENT; MAX_LAYERS];
        let mut n = 0;
        for (_, hit) in best.iter() {
            frags[n] = self.shade(hit);
            n += 1;
        }
        composite(&frags[..n], self.background)
    }
}
