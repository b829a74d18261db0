//! 2D grid spatial index for point/triangle intersection queries
//!
//! Triangles are binned by their projected bounding box, so a point query only
//! has to test the triangles of a single cell.

use log::debug;

use super::math::{barycentric, signed_area2, Affine2, Bounds2, Vec2};
use super::projection::ProjectedVertex;

/// Margin (in cells) kept inside the grid edges so points on the domain
/// boundary never round out of the grid
const CELL_MARGIN: f32 = 0.01;

/// Triangle reference stored by value in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedTriangle {
    /// Indices into the projected vertex list
    pub verts: [u32; 3],
    pub mesh: u32,
    pub surface: u32,
    /// Index within the owning surface
    pub tri: u32,
}

impl IndexedTriangle {
    /// Panics if any index does not fit in `u32`
    pub fn new(verts: [usize; 3], mesh: usize, surface: usize, tri: usize) -> Self {
        let narrow = |i: usize| {
            assert!(i <= u32::MAX as usize, "triangle index {} exceeds u32 range", i);
            i as u32
        };
        Self {
            verts: verts.map(narrow),
            mesh: narrow(mesh),
            surface: narrow(surface),
            tri: narrow(tri),
        }
    }
}

/// A point landing on an indexed triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub triangle: IndexedTriangle,
    /// Screen-space weights, non-negative and summing to 1
    pub barycentric: [f32; 3],
    /// Screen-space linear interpolation of the vertex inverse depths
    pub inv_depth: f32,
}

impl Intersection {
    /// Convert the screen-space weights into weights for attributes defined
    /// in camera space (normals, UVs), given the three vertex inverse depths.
    pub fn perspective_weights(&self, inv_depths: [f32; 3]) -> [f32; 3] {
        let w = [
            self.barycentric[0] * inv_depths[0],
            self.barycentric[1] * inv_depths[1],
            self.barycentric[2] * inv_depths[2],
        ];
        let sum = w[0] + w[1] + w[2];
        if !(sum > 0.0) {
            return self.barycentric;
        }
        [w[0] / sum, w[1] / sum, w[2] / sum]
    }
}

/// Bounds of the valid vertices, `None` if there are none or they span no area
pub fn valid_bounds(verts: &[ProjectedVertex]) -> Option<Bounds2> {
    let bounds = Bounds2::of_points(verts.iter().filter(|v| v.is_valid()).map(|v| v.position))?;
    if bounds.area() > 0.0 {
        Some(bounds)
    } else {
        None
    }
}

pub struct GridTriangles {
    verts: Vec<ProjectedVertex>,
    client_to_grid: Affine2,
    width: usize,
    height: usize,
    /// Row-major cells
    cells: Vec<Vec<IndexedTriangle>>,
}

impl GridTriangles {
    /// Build the index. Panics if the valid vertices span zero area.
    pub fn new(verts: Vec<ProjectedVertex>, tris: &[IndexedTriangle], bins_per_tri: f32) -> Self {
        match Self::try_new(verts, tris, bins_per_tri) {
            Some(grid) => grid,
            None => panic!("spatial index requires a domain with positive extent"),
        }
    }

    /// Build the index, or `None` if the valid vertices span zero area
    pub fn try_new(
        verts: Vec<ProjectedVertex>,
        tris: &[IndexedTriangle],
        bins_per_tri: f32,
    ) -> Option<Self> {
        assert!(bins_per_tri > 0.0, "bins per triangle must be positive");

        let domain = valid_bounds(&verts)?;
        let num_valid = verts.iter().filter(|v| v.is_valid()).count();

        // Keep the cell aspect ratio close to square. Neither axis may exceed
        // the bin budget, so slivers collapse to a single row or column.
        let num_bins = num_valid as f32 * bins_per_tri;
        let max_axis = num_bins.ceil().max(1.0);
        let domain_size = domain.size();
        let scale = (num_bins / domain.area()).sqrt();
        let width = (domain_size.x * scale).round().clamp(1.0, max_axis) as usize;
        let height = (domain_size.y * scale).round().clamp(1.0, max_axis) as usize;

        let range = Bounds2::new(
            Vec2::new(CELL_MARGIN, CELL_MARGIN),
            Vec2::new(width as f32 - CELL_MARGIN, height as f32 - CELL_MARGIN),
        );
        let client_to_grid = Affine2::between(domain, range);

        let mut grid = Self {
            verts,
            client_to_grid,
            width,
            height,
            cells: vec![Vec::new(); width * height],
        };

        let mut indexed = 0usize;
        for tri in tris {
            if grid.insert(*tri) {
                indexed += 1;
            }
        }

        debug!(
            "grid {}x{} over {} valid verts: indexed {} of {} tris",
            width,
            height,
            num_valid,
            indexed,
            tris.len()
        );

        Some(grid)
    }

    /// Bin a triangle into every cell its bounding box overlaps.
    /// Returns false for triangles with an invalid vertex or zero area.
    fn insert(&mut self, tri: IndexedTriangle) -> bool {
        let [a, b, c] = tri.verts.map(|i| self.verts[i as usize]);
        if !(a.is_valid() && b.is_valid() && c.is_valid()) {
            return false;
        }
        if signed_area2(a.position, b.position, c.position) == 0.0 {
            return false;
        }

        let ga = self.client_to_grid.apply(a.position);
        let gb = self.client_to_grid.apply(b.position);
        let gc = self.client_to_grid.apply(c.position);

        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x0 = ga.x.min(gb.x).min(gc.x).floor().clamp(0.0, max_x) as usize;
        let x1 = ga.x.max(gb.x).max(gc.x).floor().clamp(0.0, max_x) as usize;
        let y0 = ga.y.min(gb.y).min(gc.y).floor().clamp(0.0, max_y) as usize;
        let y1 = ga.y.max(gb.y).max(gc.y).floor().clamp(0.0, max_y) as usize;

        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells[y * self.width + x].push(tri);
            }
        }
        true
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn vertices(&self) -> &[ProjectedVertex] {
        &self.verts
    }

    /// Triangles binned in the cell containing `point`, empty outside the grid
    pub fn cell(&self, point: Vec2) -> &[IndexedTriangle] {
        let g = self.client_to_grid.apply(point);
        if !(g.x >= 0.0 && g.y >= 0.0) {
            return &[];
        }
        if g.x >= self.width as f32 || g.y >= self.height as f32 {
            return &[];
        }
        &self.cells[g.y as usize * self.width + g.x as usize]
    }

    /// Call `f` for every triangle containing `point`, in cell order
    pub fn for_each_intersect<F: FnMut(Intersection)>(&self, point: Vec2, mut f: F) {
        for tri in self.cell(point) {
            let [a, b, c] = tri.verts.map(|i| self.verts[i as usize]);
            let Some(bc) = barycentric(point, a.position, b.position, c.position) else {
                continue;
            };
            if bc[0] < 0.0 || bc[1] < 0.0 || bc[2] < 0.0 {
                continue;
            }
            let inv_depth = bc[0] * a.inv_depth + bc[1] * b.inv_depth + bc[2] * c.inv_depth;
            f(Intersection {
                triangle: *tri,
                barycentric: bc,
                inv_depth,
            });
        }
    }

    /// All triangles containing `point`, unsorted
    pub fn intersects(&self, point: Vec2) -> Vec<Intersection> {
        let mut ret = Vec::new();
        self.for_each_intersect(point, |isect| ret.push(isect));
        ret
    }

    /// The containing triangle nearest the camera (largest inverse depth)
    pub fn nearest_intersect(&self, point: Vec2) -> Option<Intersection> {
        let mut best: Option<Intersection> = None;
        self.for_each_intersect(point, |isect| {
            if best.map_or(true, |b| isect.inv_depth > b.inv_depth) {
                best = Some(isect);
            }
        });
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(x: f32, y: f32, id: f32) -> ProjectedVertex {
        ProjectedVertex::new(Vec2::new(x, y), id)
    }

    fn tri(verts: [usize; 3], idx: usize) -> IndexedTriangle {
        IndexedTriangle::new(verts, 0, 0, idx)
    }

    fn single_triangle() -> GridTriangles {
        GridTriangles::new(
            vec![pv(0.0, 0.0, 1.0), pv(4.0, 0.0, 1.0), pv(0.0, 4.0, 1.0)],
            &[tri([0, 1, 2], 0)],
            1.0,
        )
    }

    /// Unit squares over a `dim` x `dim` lattice, two triangles each, split on the diagonal
    fn lattice(dim: usize) -> (Vec<ProjectedVertex>, Vec<IndexedTriangle>) {
        let dimp = dim + 1;
        let mut verts = Vec::new();
        for y in 0..dimp {
            for x in 0..dimp {
                verts.push(pv(x as f32, y as f32, 1.0 / (1.0 + x as f32)));
            }
        }
        let mut tris = Vec::new();
        for y in 0..dim {
            for x in 0..dim {
                let i = y * dimp + x;
                tris.push(tri([i, i + 1, i + dimp + 1], tris.len()));
                tris.push(tri([i + dimp + 1, i + dimp, i], tris.len()));
            }
        }
        (verts, tris)
    }

    #[test]
    fn test_containment() {
        let grid = single_triangle();
        let isect = grid.nearest_intersect(Vec2::new(1.0, 1.0)).unwrap();
        assert!((isect.barycentric[0] - 0.5).abs() < 1e-6);
        assert!((isect.barycentric[1] - 0.25).abs() < 1e-6);
        assert!((isect.barycentric[2] - 0.25).abs() < 1e-6);
        assert!((isect.inv_depth - 1.0).abs() < 1e-6);

        assert!(grid.nearest_intersect(Vec2::new(3.0, 3.0)).is_none());
        assert!(grid.intersects(Vec2::new(3.0, 3.0)).is_empty());
    }

    #[test]
    fn test_grid_miss_outside_domain() {
        let (verts, tris) = lattice(10);
        let grid = GridTriangles::new(verts, &tris, 1.0);
        for p in [
            Vec2::new(-0.1, 0.0),
            Vec2::new(10.1, 0.0),
            Vec2::new(5.0, -0.1),
            Vec2::new(5.0, 10.1),
            Vec2::new(-1e6, 1e6),
            Vec2::new(f32::NAN, 5.0),
        ] {
            assert!(grid.intersects(p).is_empty());
            assert!(grid.nearest_intersect(p).is_none());
        }
    }

    #[test]
    fn test_lattice_queries_reconstruct_point() {
        let (verts, tris) = lattice(10);
        let grid = GridTriangles::new(verts.clone(), &tris, 1.0);
        let mut seed = 12345u32;
        let mut rand = || {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            (seed >> 8) as f32 / (1u32 << 24) as f32
        };
        for _ in 0..200 {
            let p = Vec2::new(rand() * 10.0, rand() * 10.0);
            let hits = grid.intersects(p);
            assert!(!hits.is_empty());
            for h in hits {
                let bc = h.barycentric;
                assert!(bc.iter().all(|&w| w >= 0.0));
                assert!((bc[0] + bc[1] + bc[2] - 1.0).abs() < 1e-5);
                let [a, b, c] = h.triangle.verts.map(|i| verts[i as usize].position);
                let rx = a.x * bc[0] + b.x * bc[1] + c.x * bc[2];
                let ry = a.y * bc[0] + b.y * bc[1] + c.y * bc[2];
                assert!((rx - p.x).abs() < 1e-4 && (ry - p.y).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_nearest_prefers_largest_inverse_depth() {
        // Two coincident triangles at different depths
        let verts = vec![
            pv(0.0, 0.0, 0.5),
            pv(4.0, 0.0, 0.5),
            pv(0.0, 4.0, 0.5),
            pv(0.0, 0.0, 2.0),
            pv(4.0, 0.0, 2.0),
            pv(0.0, 4.0, 2.0),
        ];
        let grid = GridTriangles::new(verts, &[tri([0, 1, 2], 0), tri([3, 4, 5], 1)], 1.0);
        assert_eq!(grid.intersects(Vec2::new(1.0, 1.0)).len(), 2);
        let near = grid.nearest_intersect(Vec2::new(1.0, 1.0)).unwrap();
        assert_eq!(near.triangle.tri, 1);
        assert!((near.inv_depth - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_and_degenerate_tris_not_indexed() {
        let verts = vec![
            pv(0.0, 0.0, 1.0),
            pv(4.0, 0.0, 1.0),
            pv(0.0, 4.0, 1.0),
            ProjectedVertex::INVALID,
            pv(2.0, 0.0, 1.0),
        ];
        let tris = [tri([0, 1, 3], 0), tri([0, 4, 1], 1), tri([0, 1, 2], 2)];
        let grid = GridTriangles::new(verts, &tris, 1.0);
        // Invalid vertex excluded from the bounds
        let p = Vec2::new(0.5, 0.0);
        let hits = grid.intersects(p);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].triangle.tri, 2);
    }

    #[test]
    fn test_bin_count_follows_vertex_count() {
        let (verts, tris) = lattice(10);
        let grid = GridTriangles::new(verts, &tris, 1.0);
        // 121 vertices over a square domain
        assert_eq!(grid.dims(), (11, 11));

        let wide = vec![pv(0.0, 0.0, 4.0), pv(4.0, 0.0, 1.0), pv(0.0, 1.0, 1.0)];
        let grid = GridTriangles::new(wide, &[tri([0, 1, 2], 0)], 4.0);
        // 12 bins over a 4:1 domain
        assert_eq!(grid.dims(), (7, 2));

        // Long thin domain: width capped at the bin budget
        let wide = vec![pv(0.0, 0.0, 1.0), pv(100.0, 0.0, 1.0), pv(0.0, 1.0, 1.0)];
        let grid = GridTriangles::new(wide, &[tri([0, 1, 2], 0)], 1.0);
        assert_eq!(grid.dims(), (3, 1));
    }

    #[test]
    fn test_sliver_domain_dims_bounded() {
        let sliver = vec![pv(0.0, 0.0, 1.0), pv(1.0, 0.0, 1.0), pv(0.0, 1e-18, 1.0)];
        let grid = GridTriangles::new(sliver, &[tri([0, 1, 2], 0)], 1.0);
        assert_eq!(grid.dims(), (3, 1));
        assert_eq!(grid.intersects(Vec2::new(0.5, 0.0)).len(), 1);

        let tall = vec![pv(0.0, 0.0, 1.0), pv(1e-18, 0.0, 1.0), pv(0.0, 1.0, 1.0)];
        let grid = GridTriangles::new(tall, &[tri([0, 1, 2], 0)], 4.0);
        assert_eq!(grid.dims(), (1, 12));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic]
    fn test_index_past_u32_rejected() {
        IndexedTriangle::new([0, 1, u32::MAX as usize + 1], 0, 0, 0);
    }

    #[test]
    fn test_domain_corner_is_inside_grid() {
        let grid = single_triangle();
        assert_eq!(grid.intersects(Vec2::new(4.0, 0.0)).len(), 1);
        assert_eq!(grid.intersects(Vec2::new(0.0, 4.0)).len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_zero_area_domain_rejected() {
        let verts = vec![pv(1.0, 1.0, 1.0); 3];
        GridTriangles::new(verts, &[tri([0, 1, 2], 0)], 1.0);
    }

    #[test]
    fn test_perspective_weights() {
        let isect = Intersection {
            triangle: tri([0, 1, 2], 0),
            barycentric: [0.5, 0.5, 0.0],
            inv_depth: 0.75,
        };
        let w = isect.perspective_weights([1.0, 0.5, 0.25]);
        assert!((w[0] - 2.0 / 3.0).abs() < 1e-6);
        assert!((w[1] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(w[2], 0.0);
    }
}
