//! Core types for the ray caster

use std::ops::{Add, Mul};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::math::{Vec2, Vec3};
use crate::error::{RenderError, RenderResult};

/// Floating point RGBA color.
///
/// Inside the renderer RGB is alpha-premultiplied unless stated otherwise.
/// Alpha is always in `[0,1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const BLACK: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Rgba = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn gray(v: f32) -> Self {
        Self { r: v, g: v, b: v, a: 1.0 }
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }

    pub fn rgb(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Largest absolute per-channel difference (all four channels)
    pub fn max_abs_diff(self, other: Rgba) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
            .max((self.a - other.a).abs())
    }

    /// Largest channel value (all four channels)
    pub fn max_channel(self) -> f32 {
        self.r.max(self.g).max(self.b).max(self.a)
    }

    pub fn min_channel(self) -> f32 {
        self.r.min(self.g).min(self.b).min(self.a)
    }
}

impl Add for Rgba {
    type Output = Rgba;
    fn add(self, o: Rgba) -> Rgba {
        Rgba::new(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl Mul<f32> for Rgba {
    type Output = Rgba;
    fn mul(self, s: f32) -> Rgba {
        Rgba::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

/// Texture image (straight alpha, unit range)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::WHITE; width * height],
            name: String::new(),
        }
    }

    pub fn from_image(img: &image::DynamicImage, name: String) -> Self {
        let rgba = img.to_rgba8();
        let pixels = rgba.pixels().map(|p| Rgba::from_bytes(p.0)).collect();
        Self {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            pixels,
            name,
        }
    }

    /// Load texture from an image file (PNG, JPEG or BMP)
    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| RenderError::Texture {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::from_image(&img, name))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    /// Bilinear sample at `uv` in image unit coordinates (Y down) with clamped
    /// addressing. Texel centers sit at `(i + 0.5) / size`.
    pub fn sample_clamped(&self, uv: Vec2) -> Rgba {
        let fx = (uv.x * self.width as f32 - 0.5).clamp(0.0, (self.width - 1) as f32);
        let fy = (uv.y * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = self.get_pixel(x0, y0) * (1.0 - tx) + self.get_pixel(x1, y0) * tx;
        let bottom = self.get_pixel(x0, y1) * (1.0 - tx) + self.get_pixel(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

/// Surface appearance. Absent maps fall back to flat defaults at shading time.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub albedo_map: Option<Arc<Texture>>,
    /// Per-fragment shininess; the mean RGB of a sample scales the highlight
    pub specular_map: Option<Arc<Texture>>,
    pub shiny: bool,
}

/// Directional light at infinity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Unit vector pointing toward the light, camera space
    pub direction: Vec3,
    /// RGB in [0,1]
    pub color: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, 0.0, 1.0),
            color: Vec3::new(0.6, 0.6, 0.6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub ambient: Vec3,
    pub lights: Vec<Light>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Vec3::new(0.4, 0.4, 0.4),
            lights: vec![Light::default()],
        }
    }
}

impl Lighting {
    /// Preview of the light setup as seen reflected in a shiny sphere.
    /// Pixels outside the sphere are black with alpha 1/255.
    pub fn create_specular_map(&self) -> Texture {
        assert!(!self.lights.is_empty(), "specular map needs at least one light");

        const SIZE: usize = 128;
        const FRESNEL_LOW: f32 = 1.5;
        const FRESNEL_HIGH: f32 = 1.5;
        const FALLOFF_STD: f32 = 0.1;

        let inv_var = 1.0 / (2.0 * FALLOFF_STD * FALLOFF_STD);
        let mut tex = Texture::new(SIZE, SIZE);
        tex.name = "specular".to_string();

        for py in 0..SIZE {
            let yy = (py as f32 - 63.5) / 64.0;
            for px in 0..SIZE {
                let xx = (px as f32 - 63.5) / 64.0;
                let sq = xx * xx + yy * yy;
                let pixel = if sq > 1.0 {
                    Rgba::new(0.0, 0.0, 0.0, 1.0 / 255.0)
                } else {
                    let aa = 2.0 * (1.0 - sq).sqrt();
                    let sr = sq.sqrt();
                    let fresnel = (1.0 - sr) * FRESNEL_LOW + sr * FRESNEL_HIGH;
                    let r = Vec3::new(aa * xx, aa * yy, 1.0 - 2.0 * sq);
                    let mut acc = Vec3::ZERO;
                    for light in &self.lights {
                        let d = r - light.direction;
                        let bright = (-d.dot(d) * inv_var).exp() * fresnel;
                        acc = acc + light.color * bright;
                    }
                    Rgba::new(acc.x.min(1.0), acc.y.min(1.0), acc.z.min(1.0), 1.0)
                };
                tex.pixels[py * SIZE + px] = pixel;
            }
        }

        tex
    }
}

/// A group of triangles sharing one material
#[derive(Debug, Clone, Default)]
pub struct Surface {
    /// Indices into the owning mesh's vertex list
    pub tris: Vec<[usize; 3]>,
    pub material: Material,
}

/// Triangle mesh with vertices already in camera space
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Precomputed, one per position
    pub normals: Vec<Vec3>,
    /// Optional, one per position
    pub uvs: Option<Vec<Vec2>>,
    pub surfaces: Vec<Surface>,
}

impl Mesh {
    pub fn num_tris(&self) -> usize {
        self.surfaces.iter().map(|s| s.tris.len()).sum()
    }

    pub fn translated(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p = *p + offset;
        }
        self
    }

    /// Check per-vertex attribute counts and index ranges
    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |reason: String| RenderError::InvalidMesh {
            name: self.name.clone(),
            reason,
        };

        let n = self.positions.len();
        if self.normals.len() != n {
            return Err(invalid(format!("{} normals for {} vertices", self.normals.len(), n)));
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != n {
                return Err(invalid(format!("{} UVs for {} vertices", uvs.len(), n)));
            }
        }
        for (si, surf) in self.surfaces.iter().enumerate() {
            for (ti, tri) in surf.tris.iter().enumerate() {
                if tri.iter().any(|&i| i >= n) {
                    return Err(invalid(format!(
                        "surface {} triangle {} indexes past {} vertices",
                        si, ti, n
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clamped_corners_and_outside() {
        let mut tex = Texture::new(2, 2);
        tex.pixels = vec![Rgba::BLACK, Rgba::WHITE, Rgba::WHITE, Rgba::BLACK];

        // Texel centers return exact texel values
        assert_eq!(tex.sample_clamped(Vec2::new(0.25, 0.25)), Rgba::BLACK);
        assert_eq!(tex.sample_clamped(Vec2::new(0.75, 0.25)), Rgba::WHITE);
        // Clamped, not wrapped
        assert_eq!(tex.sample_clamped(Vec2::new(-3.0, -3.0)), Rgba::BLACK);
        assert_eq!(tex.sample_clamped(Vec2::new(5.0, -1.0)), Rgba::WHITE);
        // Midpoint blends all four
        let mid = tex.sample_clamped(Vec2::new(0.5, 0.5));
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_texel_texture() {
        let mut tex = Texture::new(1, 1);
        tex.pixels[0] = Rgba::new(0.2, 0.4, 0.6, 1.0);
        assert_eq!(tex.sample_clamped(Vec2::new(0.9, 0.1)), tex.pixels[0]);
    }

    #[test]
    fn test_mesh_validate() {
        let mut mesh = Mesh {
            name: "tri".to_string(),
            positions: vec![Vec3::ZERO; 3],
            normals: vec![Vec3::new(0.0, 0.0, 1.0); 3],
            uvs: None,
            surfaces: vec![Surface { tris: vec![[0, 1, 2]], material: Material::default() }],
        };
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.num_tris(), 1);

        mesh.surfaces[0].tris.push([0, 1, 3]);
        assert!(mesh.validate().is_err());

        mesh.surfaces[0].tris.pop();
        mesh.uvs = Some(vec![Vec2::default(); 2]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_specular_map_highlight_at_light() {
        let map = Lighting::default().create_specular_map();
        assert_eq!(map.width, 128);
        // Default light points straight back at the viewer: brightest at center
        let center = map.get_pixel(64, 64);
        let edge = map.get_pixel(64, 120);
        assert!(center.r > edge.r);
        assert!(center.r <= 1.0);
        assert_eq!(map.get_pixel(0, 0).r, 0.0);
    }
}
