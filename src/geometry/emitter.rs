//! Low-level shape emission into vertex buffers

use std::f32::consts::TAU;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::vertex::Vertex;

/// Number of facets around a segment cylinder
pub const CYLINDER_SLICES: usize = 12;

/// Number of triangles in a leaf disc
pub const DISC_SLICES: usize = 12;

/// Vertices appended by one [`GeometryEmitter::emit_segment`] call
pub const VERTICES_PER_SEGMENT: usize = CYLINDER_SLICES * 6;

/// Vertices appended by one [`GeometryEmitter::emit_leaf`] call
pub const VERTICES_PER_LEAF: usize = DISC_SLICES * 3;

/// Sink for tree shapes.
///
/// Shapes are described in a local frame: segments grow along +Y from the
/// origin, leaves lie in the XY plane centred on the origin.
pub trait GeometryEmitter {
    /// Tapered cylinder of `length` along local +Y
    fn emit_segment(&mut self, transform: &Mat4, radius_start: f32, radius_end: f32, length: f32, color: Vec4);

    /// Flat elliptical disc with half-extents `size`
    fn emit_leaf(&mut self, transform: &Mat4, size: Vec2, color: Vec4);
}

/// Emitter that appends triangle-list vertices to an owned buffer
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    fn push(&mut self, transform: &Mat4, position: Vec3, normal: Vec3, color: Vec4) {
        self.vertices.push(Vertex::new(
            transform.transform_point3(position),
            transform.transform_vector3(normal).normalize_or_zero(),
            color,
        ));
    }
}

impl GeometryEmitter for MeshBuilder {
    fn emit_segment(&mut self, transform: &Mat4, radius_start: f32, radius_end: f32, length: f32, color: Vec4) {
        for i in 0..CYLINDER_SLICES {
            let a0 = TAU * i as f32 / CYLINDER_SLICES as f32;
            let a1 = TAU * (i + 1) as f32 / CYLINDER_SLICES as f32;
            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();

            let n0 = Vec3::new(c0, 0.0, s0);
            let n1 = Vec3::new(c1, 0.0, s1);
            let b0 = n0 * radius_start;
            let b1 = n1 * radius_start;
            let t0 = n0 * radius_end + Vec3::Y * length;
            let t1 = n1 * radius_end + Vec3::Y * length;

            self.push(transform, b0, n0, color);
            self.push(transform, t0, n0, color);
            self.push(transform, b1, n1, color);

            self.push(transform, b1, n1, color);
            self.push(transform, t0, n0, color);
            self.push(transform, t1, n1, color);
        }
    }

    fn emit_leaf(&mut self, transform: &Mat4, size: Vec2, color: Vec4) {
        let rim = |i: usize| {
            let (s, c) = (TAU * i as f32 / DISC_SLICES as f32).sin_cos();
            Vec3::new(c * size.x, s * size.y, 0.0)
        };
        for i in 0..DISC_SLICES {
            self.push(transform, Vec3::ZERO, Vec3::Z, color);
            self.push(transform, rim(i), Vec3::Z, color);
            self.push(transform, rim(i + 1), Vec3::Z, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_vertex_count() {
        let mut mesh = MeshBuilder::new();
        mesh.emit_segment(&Mat4::IDENTITY, 0.2, 0.1, 1.0, Vec4::X);
        assert_eq!(mesh.len(), VERTICES_PER_SEGMENT);
    }

    #[test]
    fn test_leaf_vertex_count() {
        let mut mesh = MeshBuilder::new();
        mesh.emit_leaf(&Mat4::IDENTITY, Vec2::new(0.1, 0.2), Vec4::Z);
        assert_eq!(mesh.len(), VERTICES_PER_LEAF);
    }

    #[test]
    fn test_segment_spans_length_and_radii() {
        let mut mesh = MeshBuilder::new();
        mesh.emit_segment(&Mat4::IDENTITY, 0.2, 0.1, 2.0, Vec4::X);
        for v in mesh.vertices() {
            let p = v.position();
            let r = (p.x * p.x + p.z * p.z).sqrt();
            if p.y.abs() < 1e-5 {
                assert!((r - 0.2).abs() < 1e-4);
            } else {
                assert!((p.y - 2.0).abs() < 1e-5);
                assert!((r - 0.1).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_transform_is_applied() {
        let mut mesh = MeshBuilder::new();
        let transform = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        mesh.emit_leaf(&transform, Vec2::splat(0.1), Vec4::Z);
        assert_eq!(mesh.vertices()[0].position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(mesh.vertices()[0].color(), Vec4::Z);
    }
}
