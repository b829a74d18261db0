//! Scene description: meshes, materials, lighting and render settings
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files.
//! Mesh vertices are given in camera space (looking down -Z); each model can
//! be shifted by an offset when loaded.

mod demo;
mod file;

pub use demo::*;
pub use file::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::raycast::{
    soft_render, Lighting, Material, Mesh, Projection, RenderOptions, Rgba, SampledImage, Surface,
    Texture, Vec2, Vec3,
};

/// Triangle mesh data as stored in a scene file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshDesc {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<Vec2>>,
    pub tris: Vec<[usize; 3]>,
}

/// One model: a mesh plus its material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDesc {
    pub name: String,
    pub mesh: MeshDesc,
    #[serde(default)]
    pub offset: Vec3,
    /// Relative to the scene file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albedo_map: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular_map: Option<PathBuf>,
    #[serde(default)]
    pub shiny: bool,
}

impl ModelDesc {
    /// Load textures and build the camera space mesh
    pub fn build(&self, base_dir: &Path) -> RenderResult<Mesh> {
        let load = |p: &Option<PathBuf>| -> RenderResult<Option<Arc<Texture>>> {
            match p {
                Some(p) => Ok(Some(Arc::new(Texture::from_file(base_dir.join(p))?))),
                None => Ok(None),
            }
        };

        let material = Material {
            albedo_map: load(&self.albedo_map)?,
            specular_map: load(&self.specular_map)?,
            shiny: self.shiny,
        };

        let mesh = Mesh {
            name: self.name.clone(),
            positions: self.mesh.positions.clone(),
            normals: self.mesh.normals.clone(),
            uvs: self.mesh.uvs.clone(),
            surfaces: vec![Surface {
                tris: self.mesh.tris.clone(),
                material,
            }],
        }
        .translated(self.offset);

        mesh.validate()?;
        Ok(mesh)
    }
}

/// Everything needed to render one image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    pub models: Vec<ModelDesc>,
    pub lighting: Lighting,
    /// Premultiplied, channels in [0,1]
    pub background: Rgba,
    pub image_size: (u32, u32),
    /// Field of view across the larger image dimension (degrees)
    pub fov_max_deg: f32,
    pub options: RenderOptions,
    /// Relative to the scene file's directory
    pub output_file: Option<PathBuf>,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            lighting: Lighting::default(),
            background: Rgba::TRANSPARENT,
            image_size: (512, 512),
            fov_max_deg: 17.0,
            options: RenderOptions::default(),
            output_file: None,
        }
    }
}

impl SceneFile {
    /// Check settings that would otherwise trip render preconditions
    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: String| Err(RenderError::InvalidScene(msg));

        let (w, h) = self.image_size;
        if w == 0 || h == 0 {
            return invalid(format!("image size {}x{} is empty", w, h));
        }
        let bits = self.options.anti_alias_bit_depth;
        if !(1..=16).contains(&bits) {
            return invalid(format!("anti_alias_bit_depth {} not in [1,16]", bits));
        }
        if !(self.options.bins_per_tri > 0.0) {
            return invalid(format!("bins_per_tri {} must be positive", self.options.bins_per_tri));
        }
        if !(self.fov_max_deg > 0.0 && self.fov_max_deg < 180.0) {
            return invalid(format!("fov_max_deg {} not in (0,180)", self.fov_max_deg));
        }
        let bg = self.background;
        if bg.min_channel() < 0.0 || bg.max_channel() > 1.0 {
            return invalid(format!("background {:?} outside [0,1]", bg));
        }
        if bg.r > bg.a || bg.g > bg.a || bg.b > bg.a {
            return invalid(format!("background {:?} is not premultiplied", bg));
        }
        Ok(())
    }

    pub fn build_meshes(&self, base_dir: &Path) -> RenderResult<Vec<Mesh>> {
        self.models.iter().map(|m| m.build(base_dir)).collect()
    }

    pub fn projection(&self) -> Projection {
        Projection::from_fov(self.fov_max_deg, self.image_size.0, self.image_size.1)
    }

    /// Validate, load and render
    pub fn render(&self, base_dir: &Path) -> RenderResult<SampledImage> {
        self.validate()?;
        let meshes = self.build_meshes(base_dir)?;
        Ok(soft_render(
            self.image_size.0 as usize,
            self.image_size.1 as usize,
            &meshes,
            &self.lighting,
            &self.projection(),
            self.background,
            &self.options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut scene = SceneFile::default();
        assert!(scene.validate().is_ok());

        scene.image_size = (0, 10);
        assert!(scene.validate().is_err());
        scene.image_size = (10, 10);

        scene.options.anti_alias_bit_depth = 17;
        assert!(scene.validate().is_err());
        scene.options.anti_alias_bit_depth = 3;

        scene.background = Rgba::new(1.0, 0.0, 0.0, 0.5);
        assert!(matches!(scene.validate(), Err(RenderError::InvalidScene(_))));
    }

    #[test]
    fn test_model_offset_and_validation() {
        let model = ModelDesc {
            name: "bad".to_string(),
            mesh: MeshDesc {
                positions: vec![Vec3::ZERO; 3],
                normals: vec![Vec3::ZERO; 2],
                uvs: None,
                tris: vec![[0, 1, 2]],
            },
            ..ModelDesc::default()
        };
        assert!(matches!(
            model.build(Path::new(".")),
            Err(RenderError::InvalidMesh { .. })
        ));

        let mut model = model;
        model.mesh.normals.push(Vec3::ZERO);
        model.offset = Vec3::new(0.0, 0.0, -3.0);
        let mesh = model.build(Path::new(".")).unwrap();
        assert_eq!(mesh.positions[0].z, -3.0);
    }

    #[test]
    fn test_missing_texture_is_error() {
        let model = ModelDesc {
            albedo_map: Some(PathBuf::from("does/not/exist.png")),
            ..ModelDesc::default()
        };
        assert!(matches!(
            model.build(Path::new(".")),
            Err(RenderError::Texture { .. })
        ));
    }
}
