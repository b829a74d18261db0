//! Camera space to image space projection
//!
//! Camera space looks down -Z with +Y up. Image tangent space (ITCS) is the
//! perspective divided position with Y flipped so it grows downward, and image
//! unit space (IUCS) covers the image as `[0,1]²`.

use serde::{Deserialize, Serialize};

use super::math::{Affine2, Bounds2, Vec2, Vec3};

/// A vertex after projection. Only vertices in front of the camera are valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedVertex {
    /// Position in IUCS
    pub position: Vec2,
    /// Reciprocal of the distance along the view axis, > 0 when valid
    pub inv_depth: f32,
}

impl ProjectedVertex {
    /// Reserved marker for vertices on or behind the camera plane
    pub const INVALID: ProjectedVertex = ProjectedVertex {
        position: Vec2 { x: f32::MAX, y: f32::MAX },
        inv_depth: -1.0,
    };

    pub fn new(position: Vec2, inv_depth: f32) -> Self {
        Self { position, inv_depth }
    }

    pub fn is_valid(&self) -> bool {
        self.inv_depth > 0.0
            && self.position.x.is_finite()
            && self.position.y.is_finite()
            && self.position != Self::INVALID.position
    }
}

/// Maps camera space positions into IUCS with their inverse depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub itcs_to_iucs: Affine2,
}

impl Projection {
    pub fn new(itcs_to_iucs: Affine2) -> Self {
        Self { itcs_to_iucs }
    }

    /// Symmetric perspective where the larger image axis spans `fov_max_deg`.
    /// The principal point is the image center.
    pub fn from_fov(fov_max_deg: f32, width: u32, height: u32) -> Self {
        assert!(
            fov_max_deg > 0.0 && fov_max_deg < 180.0,
            "field of view must be in (0, 180) degrees, got {}",
            fov_max_deg
        );
        assert!(width > 0 && height > 0, "image size must be non-zero");

        let half_max = (fov_max_deg.to_radians() * 0.5).tan();
        let max_dim = width.max(height) as f32;
        let hx = half_max * width as f32 / max_dim;
        let hy = half_max * height as f32 / max_dim;
        let itcs = Bounds2::new(Vec2::new(-hx, -hy), Vec2::new(hx, hy));
        let iucs = Bounds2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        Self::new(Affine2::between(itcs, iucs))
    }

    /// Perspective divide into ITCS, or `None` on/behind the camera plane
    pub fn to_itcs(v: Vec3) -> Option<(Vec2, f32)> {
        if !(v.z < 0.0) {
            return None;
        }
        let inv_depth = -1.0 / v.z;
        Some((Vec2::new(v.x * inv_depth, -v.y * inv_depth), inv_depth))
    }

    pub fn project(&self, v: Vec3) -> ProjectedVertex {
        match Self::to_itcs(v) {
            Some((itcs, inv_depth)) => {
                ProjectedVertex::new(self.itcs_to_iucs.apply(itcs), inv_depth)
            }
            None => ProjectedVertex::INVALID,
        }
    }

    pub fn project_all(&self, verts: &[Vec3]) -> Vec<ProjectedVertex> {
        verts.iter().map(|&v| self.project(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behind_camera_is_invalid() {
        let proj = Projection::from_fov(60.0, 100, 100);
        assert!(!proj.project(Vec3::new(0.0, 0.0, 1.0)).is_valid());
        assert!(!proj.project(Vec3::new(0.0, 0.0, 0.0)).is_valid());
        assert!(proj.project(Vec3::new(0.0, 0.0, -1.0)).is_valid());
    }

    #[test]
    fn test_axis_projects_to_center() {
        let proj = Projection::from_fov(30.0, 200, 100);
        let pv = proj.project(Vec3::new(0.0, 0.0, -4.0));
        assert!((pv.position.x - 0.5).abs() < 1e-6);
        assert!((pv.position.y - 0.5).abs() < 1e-6);
        assert!((pv.inv_depth - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_up_is_image_top() {
        let proj = Projection::from_fov(90.0, 64, 64);
        // tan(45deg) = 1, so a point at the edge of the view maps to the edge of the image
        let top_right = proj.project(Vec3::new(2.0, 2.0, -2.0));
        assert!((top_right.position.x - 1.0).abs() < 1e-5);
        assert!(top_right.position.y.abs() < 1e-5);
    }
}
