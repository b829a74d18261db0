//! Vector math for ray casting
//!
//! Vectors are plain `f32` triples/pairs. Barycentric solves run in `f64`
//! since projected triangles can be tiny relative to the image.

use std::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `ZERO` for (near) zero length input
    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if !(l > f32::EPSILON) {
            return Vec3::ZERO;
        }
        self.scale(1.0 / l)
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Component-wise product
    pub fn mul_elem(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    /// Rotate about the X axis (radians)
    pub fn rotate_x(self, angle: f32) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(self.x, self.y * c - self.z * s, self.y * s + self.z * c)
    }

    /// Rotate about the Y axis (radians)
    pub fn rotate_y(self, angle: f32) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(self.x * c + self.z * s, self.y, -self.x * s + self.z * c)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector (image positions and texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

/// Axis-aligned 2D bounds (inclusive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub lo: Vec2,
    pub hi: Vec2,
}

impl Bounds2 {
    pub fn new(lo: Vec2, hi: Vec2) -> Self {
        Self { lo, hi }
    }

    /// Bounds of a set of points, `None` if empty
    pub fn of_points<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds2::new(first, first);
        for p in iter {
            b.lo.x = b.lo.x.min(p.x);
            b.lo.y = b.lo.y.min(p.y);
            b.hi.x = b.hi.x.max(p.x);
            b.hi.y = b.hi.y.max(p.y);
        }
        Some(b)
    }

    pub fn size(&self) -> Vec2 {
        self.hi - self.lo
    }

    pub fn area(&self) -> f32 {
        let s = self.size();
        s.x * s.y
    }
}

/// Element-wise 2D affine map: `out = scale * in + offset` per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub scale: Vec2,
    pub offset: Vec2,
}

impl Affine2 {
    pub fn new(scale: Vec2, offset: Vec2) -> Self {
        Self { scale, offset }
    }

    /// Map that takes `domain` onto `range` corner to corner.
    /// Panics if `domain` has zero extent on either axis.
    pub fn between(domain: Bounds2, range: Bounds2) -> Self {
        let ds = domain.size();
        let rs = range.size();
        assert!(ds.x != 0.0 && ds.y != 0.0, "affine domain must have non-zero extent");
        let scale = Vec2::new(rs.x / ds.x, rs.y / ds.y);
        let offset = Vec2::new(
            range.lo.x - domain.lo.x * scale.x,
            range.lo.y - domain.lo.y * scale.y,
        );
        Self { scale, offset }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.scale.x + self.offset.x, p.y * self.scale.y + self.offset.y)
    }
}

/// Barycentric coordinates of `p` with respect to triangle `(v0, v1, v2)`.
///
/// Solves `p - v0 = b1 * (v1 - v0) + b2 * (v2 - v0)` and returns `[1 - b1 - b2, b1, b2]`.
/// Returns `None` for a degenerate (zero determinant) triangle. The weights always sum
/// to 1; they are all non-negative iff `p` lies inside or on the triangle.
pub fn barycentric(p: Vec2, v0: Vec2, v1: Vec2, v2: Vec2) -> Option<[f32; 3]> {
    let e1x = (v1.x - v0.x) as f64;
    let e1y = (v1.y - v0.y) as f64;
    let e2x = (v2.x - v0.x) as f64;
    let e2y = (v2.y - v0.y) as f64;
    let dx = (p.x - v0.x) as f64;
    let dy = (p.y - v0.y) as f64;

    let det = e1x * e2y - e2x * e1y;
    if det == 0.0 {
        return None;
    }

    let b1 = (dx * e2y - e2x * dy) / det;
    let b2 = (e1x * dy - dx * e1y) / det;
    let b0 = 1.0 - b1 - b2;

    Some([b0 as f32, b1 as f32, b2 as f32])
}

/// Twice the signed area of a 2D triangle
pub fn signed_area2(v0: Vec2, v1: Vec2, v2: Vec2) -> f32 {
    (v1.x - v0.x) * (v2.y - v0.y) - (v2.x - v0.x) * (v1.y - v0.y)
}
