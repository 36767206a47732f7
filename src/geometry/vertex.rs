//! Vertex layout of emitted tree geometry

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// A renderable vertex. Layout matches a `vec3 position, vec3 normal,
/// vec4 color` vertex input so buffers can be uploaded as-is.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color: color.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
    }

    #[test]
    fn test_vertex_cast_to_bytes() {
        let vertices = [Vertex::new(Vec3::ONE, Vec3::Y, Vec4::ONE); 3];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 120);
    }
}
