//! Built-in demo scene

use super::{MeshDesc, ModelDesc, SceneFile};
use crate::raycast::{Vec2, Vec3};

/// Cube with per-face normals and UVs, centered at the origin
pub fn create_test_cube(half_size: f32) -> MeshDesc {
    let s = half_size;

    let positions = [
        // Front face
        Vec3::new(-s, -s, s),
        Vec3::new(s, -s, s),
        Vec3::new(s, s, s),
        Vec3::new(-s, s, s),
        // Back face
        Vec3::new(-s, -s, -s),
        Vec3::new(-s, s, -s),
        Vec3::new(s, s, -s),
        Vec3::new(s, -s, -s),
        // Top face
        Vec3::new(-s, s, -s),
        Vec3::new(-s, s, s),
        Vec3::new(s, s, s),
        Vec3::new(s, s, -s),
        // Bottom face
        Vec3::new(-s, -s, -s),
        Vec3::new(s, -s, -s),
        Vec3::new(s, -s, s),
        Vec3::new(-s, -s, s),
        // Right face
        Vec3::new(s, -s, -s),
        Vec3::new(s, s, -s),
        Vec3::new(s, s, s),
        Vec3::new(s, -s, s),
        // Left face
        Vec3::new(-s, -s, -s),
        Vec3::new(-s, -s, s),
        Vec3::new(-s, s, s),
        Vec3::new(-s, s, -s),
    ];

    let face_normals = [
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
    ];

    let face_uvs = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];

    let mut mesh = MeshDesc {
        positions: positions.to_vec(),
        normals: Vec::with_capacity(24),
        uvs: Some(Vec::with_capacity(24)),
        tris: Vec::with_capacity(12),
    };

    for (face, &normal) in face_normals.iter().enumerate() {
        let base = face * 4;
        mesh.normals.extend([normal; 4]);
        if let Some(uvs) = mesh.uvs.as_mut() {
            uvs.extend(face_uvs);
        }
        // Two triangles per face
        mesh.tris.push([base, base + 1, base + 2]);
        mesh.tris.push([base, base + 2, base + 3]);
    }

    mesh
}

impl MeshDesc {
    /// Rotate positions and normals about X then Y (radians)
    pub fn rotated(mut self, angle_x: f32, angle_y: f32) -> Self {
        for p in self.positions.iter_mut().chain(self.normals.iter_mut()) {
            *p = p.rotate_x(angle_x).rotate_y(angle_y);
        }
        self
    }
}

/// A shiny cube five units in front of the camera, turned to show three faces
pub fn demo_scene() -> SceneFile {
    let cube = ModelDesc {
        name: "cube".to_string(),
        mesh: create_test_cube(0.5).rotated(0.45, 0.6),
        offset: Vec3::new(0.0, 0.0, -5.0),
        albedo_map: None,
        specular_map: None,
        shiny: true,
    };

    SceneFile {
        models: vec![cube],
        fov_max_deg: 30.0,
        ..SceneFile::default()
    }
}
