//! Per-fragment shading: ambient + diffuse + optional specular highlight
//!
//! Output RGB is alpha-premultiplied and deliberately not clamped.

use super::math::{Vec2, Vec3};
use super::types::{Lighting, Material, Rgba};

/// Flat albedo used when a surface has no texture (230/255 gray, opaque)
pub const DEFAULT_ALBEDO: Rgba = Rgba {
    r: 230.0 / 255.0,
    g: 230.0 / 255.0,
    b: 230.0 / 255.0,
    a: 1.0,
};

/// Highlight falloff: larger is a tighter highlight
const SPECULAR_SHARPNESS: f32 = 32.0;

/// Surface attributes at one intersection, camera space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Unit normal, or zero if the interpolated normal degenerated
    pub normal: Vec3,
    /// Texture coordinate in the authored convention (V up)
    pub uv: Option<Vec2>,
}

impl Fragment {
    /// Interpolate vertex attributes with the given (camera space) weights
    pub fn interpolate(normals: [Vec3; 3], uvs: Option<[Vec2; 3]>, weights: [f32; 3]) -> Self {
        let normal = (normals[0] * weights[0] + normals[1] * weights[1] + normals[2] * weights[2])
            .normalize();
        let uv = uvs.map(|uv| uv[0] * weights[0] + uv[1] * weights[1] + uv[2] * weights[2]);
        Self { normal, uv }
    }
}

#[derive(Debug, Clone)]
pub struct Shader {
    pub lighting: Lighting,
    pub default_albedo: Rgba,
}

impl Shader {
    pub fn new(lighting: Lighting, default_albedo: Rgba) -> Self {
        Self { lighting, default_albedo }
    }

    pub fn shade(&self, frag: &Fragment, material: &Material) -> Rgba {
        // Authored UVs have V up, images are stored top row first
        let uv_img = frag.uv.map(|uv| Vec2::new(uv.x, 1.0 - uv.y));

        let albedo = match (uv_img, material.albedo_map.as_deref()) {
            (Some(uv), Some(tex)) if !tex.is_empty() => tex.sample_clamped(uv),
            _ => self.default_albedo,
        };

        let specular = if material.shiny {
            1.0
        } else {
            match (uv_img, material.specular_map.as_deref()) {
                (Some(uv), Some(tex)) if !tex.is_empty() => {
                    let s = tex.sample_clamped(uv);
                    (s.r + s.g + s.b) / 3.0
                }
                _ => 0.0,
            }
        };

        let surface = albedo.rgb() * albedo.a;
        let normal = frag.normal;
        let mut acc = Vec3::ZERO;

        for light in &self.lighting.lights {
            let fac = normal.dot(light.direction);
            if fac > 0.0 {
                acc = acc + surface.mul_elem(light.color) * fac;
                if specular > 0.0 {
                    let reflect = normal * (fac * 2.0) - light.direction;
                    // Only highlights reflecting back toward the camera
                    if reflect.z > 0.0 {
                        let delta_sqr = reflect.x * reflect.x + reflect.y * reflect.y;
                        let val = (-delta_sqr * SPECULAR_SHARPNESS).exp() * specular;
                        acc = acc + Vec3::new(val, val, val);
                    }
                }
            }
        }

        acc = acc + surface.mul_elem(self.lighting.ambient);
        Rgba::new(acc.x, acc.y, acc.z, albedo.a)
    }
}
